// tests/integration_tests.rs
// Holistic integration tests for the creative testing log
//
// These tests verify the full flow:
// 1. Metric derivation and enrichment
// 2. Pairing and winner selection
// 3. Ledger persistence across every store
// 4. Parsing creative batches from the data source
// 5. End-to-end comparison cycles, including degraded persistence

// ============================================================================
// METRIC TESTS - Derivation edge cases through the public API
// ============================================================================

mod metric_tests {
    use signalone::metrics::*;

    /// Test: ROAS is undefined for any non-positive or missing spend
    #[test]
    fn test_roas_undefined_without_positive_spend() {
        for spend in [None, Some(0.0), Some(-0.01), Some(-100.0)] {
            assert_eq!(derive_roas(Some(250.0), spend), None, "spend {:?}", spend);
        }
        assert_eq!(derive_roas(Some(250.0), Some(50.0)), Some(5.0));
    }

    /// Test: CTR and CPM are undefined for any non-positive or missing impressions
    #[test]
    fn test_ctr_cpm_undefined_without_impressions() {
        for impressions in [None, Some(0.0), Some(-3.0)] {
            assert_eq!(derive_ctr(Some(10.0), impressions), None);
            assert_eq!(derive_cpm(Some(10.0), impressions), None);
        }
        let ctr = derive_ctr(Some(10.0), Some(500.0)).unwrap();
        let cpm = derive_cpm(Some(10.0), Some(500.0)).unwrap();
        assert!((ctr - 2.0).abs() < 1e-9, "ctr was {}", ctr);
        assert!((cpm - 20.0).abs() < 1e-9, "cpm was {}", cpm);
    }
}

// ============================================================================
// PAIRING TESTS - Concrete winner, tie and odd-count cases
// ============================================================================

mod pairing_tests {
    use signalone::pairing::build_comparisons;
    use signalone::{CreativeRecord, Winner};

    /// Test: Higher ROAS on A wins
    #[test]
    fn test_higher_roas_wins() {
        let records = vec![
            CreativeRecord::new("cr1", "Hook").with_roas(4.8),
            CreativeRecord::new("cr2", "Offer").with_roas(2.1),
        ];
        let entries = build_comparisons(&records).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].winner(), Winner::A);
        assert_eq!(entries[0].winning_creative_id(), Some("cr1"));
    }

    /// Test: No ROAS on either side is a tie
    #[test]
    fn test_missing_roas_both_sides_ties() {
        let records = vec![CreativeRecord::new("cr1", ""), CreativeRecord::new("cr2", "")];
        let entries = build_comparisons(&records).unwrap();
        assert_eq!(entries[0].winner(), Winner::Tie);
    }

    /// Test: Three records produce one comparison; the third is never compared
    #[test]
    fn test_odd_count_drops_last() {
        let records = vec![
            CreativeRecord::new("x", "X"),
            CreativeRecord::new("y", "Y"),
            CreativeRecord::new("z", "Z").with_roas(10.0),
        ];
        let entries = build_comparisons(&records).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].creative_a().id, "x");
        assert_eq!(entries[0].creative_b().id, "y");
        assert!(!entries.iter().any(|e| e.id().contains('z')));
    }
}

// ============================================================================
// STORAGE TESTS - Round trip through every durable medium
// ============================================================================

mod storage_tests {
    use signalone::pairing::build_comparisons_at;
    use signalone::{
        CreativeRecord, JsonFileLedgerStore, Ledger, LedgerStore, MemoryLedgerStore,
        SqliteLedgerStore,
    };

    fn ledger_fixture() -> Ledger {
        let records = vec![
            CreativeRecord::new("120210001", "UGC testimonial")
                .with_roas(4.8)
                .with_ctr(1.92)
                .with_cpm(14.37)
                .with_spend(812.44)
                .with_purchases(31.0),
            CreativeRecord::new("120210002", "Static 20% off").with_roas(2.1),
            CreativeRecord::new("120210003", "Carousel"),
            CreativeRecord::new("120210004", "Founder video").with_roas(0.1 + 0.2),
            CreativeRecord::new("120210005", "Overflowed").with_roas(f64::INFINITY),
            CreativeRecord::new("120210006", "Steady").with_roas(1.0),
        ];
        let mut ledger = Ledger::new();
        ledger.append_new(build_comparisons_at(&records, 1_730_000_000_000).unwrap());
        ledger
    }

    fn assert_roundtrip(store: &dyn LedgerStore) {
        let ledger = ledger_fixture();
        store.save(&ledger).unwrap();
        assert_eq!(store.load(), ledger, "{} round trip", store.backend_name());
    }

    #[test]
    fn test_memory_roundtrip() {
        assert_roundtrip(&MemoryLedgerStore::new());
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert_roundtrip(&JsonFileLedgerStore::new(dir.path().join("testing_log.json")));
    }

    #[test]
    fn test_sqlite_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteLedgerStore::open(dir.path().join("testing_log.db"), "acct_1").unwrap();
        assert_roundtrip(&store);
    }

    /// Test: A non-finite ROAS is stored as missing, matching the verdict
    #[test]
    fn test_non_finite_roas_stored_as_missing() {
        let store = MemoryLedgerStore::new();
        store.save(&ledger_fixture()).unwrap();
        let loaded = store.load();
        let entry = loaded.get("120210005_vs_120210006").unwrap();
        assert_eq!(entry.metrics_a().roas, None);
        assert_eq!(entry.winning_creative_id(), Some("120210006"));
    }

    /// Test: A ledger saved to a file is readable by a fresh store instance
    #[test]
    fn test_json_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testing_log.json");
        JsonFileLedgerStore::new(&path).save(&ledger_fixture()).unwrap();
        assert_eq!(JsonFileLedgerStore::new(&path).load(), ledger_fixture());
    }
}

// ============================================================================
// SOURCE TESTS - Creative batches as handed over by the data source
// ============================================================================

mod source_tests {
    use serde_json::json;
    use signalone::source::{parse_creatives, parse_creatives_str, parse_insights};
    use signalone::LedgerError;

    /// Test: A plain array keeps input order and leaves absent metrics unset
    #[test]
    fn test_plain_array_in_order() {
        let records = parse_creatives_str(
            r#"[{"id": "cr2", "name": "Offer", "roas": 2.1}, {"id": "cr1", "name": "Hook"}]"#,
        )
        .unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["cr2", "cr1"]);
        assert_eq!(records[0].roas, Some(2.1));
        assert_eq!(records[1].roas, None);
    }

    /// Test: Graph insights rows carry string-encoded numbers and action breakdowns
    #[test]
    fn test_insights_rows_coerce() {
        let payload = json!({
            "data": [{
                "ad_id": "a1", "ad_name": "Spring UGC",
                "spend": "200", "impressions": "10000", "clicks": "150",
                "actions": [{"action_type": "purchase", "value": "12"}],
                "action_values": [{"action_type": "purchase", "value": "600"}]
            }]
        });
        let via_insights = parse_insights(&payload).unwrap();
        assert_eq!(via_insights, parse_creatives(&payload).unwrap());

        let r = &via_insights[0];
        assert_eq!(r.id, "a1");
        assert_eq!(r.spend, Some(200.0));
        assert_eq!(r.purchases, Some(12.0));
        assert_eq!(r.revenue, Some(600.0));
        assert_eq!(r.roas, None, "left for enrichment");
    }

    /// Test: Anything that is not a creative sequence is InvalidInput
    #[test]
    fn test_non_sequences_rejected() {
        for bad in ["42", "\"cr1,cr2\"", "{\"id\": \"cr1\"}", "{\"data\": 3}", "not json"] {
            let err = parse_creatives_str(bad).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidInput(_)), "{} should be rejected", bad);
        }
        assert!(matches!(parse_insights(&json!([])), Err(LedgerError::InvalidInput(_))));
    }
}

// ============================================================================
// CYCLE TESTS - End-to-end orchestration
// ============================================================================

mod cycle_tests {
    use serde_json::json;
    use signalone::{
        CreativeRecord, JsonFileLedgerStore, Ledger, LedgerError, LedgerStore,
        MemoryLedgerStore, PersistStatus, SqliteLedgerStore, TestingLogService, Winner,
    };

    /// Store whose medium rejects every write
    struct FailingStore;

    impl LedgerStore for FailingStore {
        fn backend_name(&self) -> &'static str {
            "failing"
        }

        fn try_load(&self) -> Result<Ledger, LedgerError> {
            Ok(Ledger::new())
        }

        fn save(&self, _ledger: &Ledger) -> Result<(), LedgerError> {
            Err(LedgerError::StorageWrite("medium unavailable".to_string()))
        }
    }

    fn batch() -> Vec<CreativeRecord> {
        vec![
            CreativeRecord::new("cr1", "Hook").with_roas(4.8),
            CreativeRecord::new("cr2", "Offer").with_roas(2.1),
            CreativeRecord::new("cr3", "Carousel"),
            CreativeRecord::new("cr4", "Video"),
            CreativeRecord::new("cr5", "Leftover").with_roas(9.0),
        ]
    }

    /// Test: Running the same batch twice yields the same entries as running it once
    #[test]
    fn test_cycle_idempotent() {
        let service = TestingLogService::new(MemoryLedgerStore::new());
        let once = service.run_comparison_cycle(&batch()).unwrap();
        let twice = service.run_comparison_cycle(&batch()).unwrap();

        assert_eq!(once.ledger.len(), 2);
        assert_eq!(twice.ledger, once.ledger);
        assert_eq!((twice.added, twice.skipped), (0, 2));
    }

    /// Test: Save failure is reported, never thrown, and the ledger is complete
    #[test]
    fn test_save_failure_contained() {
        let service = TestingLogService::new(FailingStore);
        let outcome = service.run_comparison_cycle(&batch()).unwrap();

        assert_eq!(outcome.ledger.len(), 2);
        assert_eq!(outcome.added, 2);
        assert_eq!(
            outcome.persisted,
            PersistStatus::Failed("storage write failure: medium unavailable".to_string())
        );
        assert!(!outcome.persisted.is_saved());
    }

    /// Test: Unreadable storage degrades to an empty ledger and is then overwritten
    #[test]
    fn test_corrupt_storage_rebuilt() {
        let service = TestingLogService::new(MemoryLedgerStore::with_raw("<html>quota</html>"));
        let outcome = service.run_comparison_cycle(&batch()).unwrap();
        assert_eq!(outcome.ledger.len(), 2);
        assert!(outcome.persisted.is_saved());
        assert_eq!(service.ledger(), outcome.ledger);
    }

    /// Test: Non-sequence payloads are rejected with InvalidInput
    #[test]
    fn test_non_sequence_payload_rejected() {
        let service = TestingLogService::new(MemoryLedgerStore::new());
        let err = service.run_comparison_cycle_json(&json!({"id": "cr1"})).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert!(service.ledger().is_empty());
    }

    /// Test: Ids that would share an entry id with another pair never reach the ledger
    #[test]
    fn test_colliding_ids_rejected() {
        let service = TestingLogService::new(MemoryLedgerStore::new());
        let first = [CreativeRecord::new("x_vs_y", "X"), CreativeRecord::new("z", "Z")];
        let second = [CreativeRecord::new("x", "X"), CreativeRecord::new("y_vs_z", "Y")];

        for batch in [&first, &second] {
            let err = service.run_comparison_cycle(batch).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidInput(_)));
        }
        assert!(service.ledger().is_empty());
        assert_eq!(service.store().save_count(), 0);
    }

    /// Test: An enrichment overflow is no measurement and survives a file reload
    #[test]
    fn test_overflowing_enrichment_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testing_log.json");
        let service = TestingLogService::new(JsonFileLedgerStore::new(&path));

        let a = CreativeRecord::new("a1", "Tiny spend")
            .with_spend(1e-300)
            .with_counters(1e308, 0.0, 0.0);
        let b = CreativeRecord::new("a2", "Normal").with_roas(1.0);
        let outcome = service.run_comparison_cycle(&[a, b]).unwrap();

        let entry = &outcome.ledger.entries()[0];
        assert_eq!(entry.metrics_a().roas, None);
        assert_eq!(entry.winner(), Winner::B);
        assert!(outcome.persisted.is_saved());
        assert_eq!(JsonFileLedgerStore::new(&path).load(), outcome.ledger);
    }

    /// Test: A Graph insights payload goes through enrichment into the ledger
    #[test]
    fn test_insights_payload_cycle_on_sqlite() {
        let store = SqliteLedgerStore::open_in_memory("acct_9").unwrap();
        let service = TestingLogService::new(store);

        let payload = json!({
            "data": [
                {
                    "ad_id": "a1", "ad_name": "Spring UGC",
                    "spend": "200", "impressions": "10000", "clicks": "150",
                    "action_values": [{"action_type": "purchase", "value": "600"}]
                },
                {
                    "ad_id": "a2", "ad_name": "Spring Static",
                    "spend": "200", "impressions": "8000", "clicks": "40",
                    "action_values": [{"action_type": "purchase", "value": "900"}]
                }
            ]
        });

        let outcome = service.run_comparison_cycle_json(&payload).unwrap();
        let entry = &outcome.ledger.entries()[0];
        assert_eq!(entry.id(), "a1_vs_a2");
        assert_eq!(entry.metrics_a().roas, Some(3.0));
        assert_eq!(entry.metrics_b().roas, Some(4.5));
        let ctr = entry.metrics_a().ctr.unwrap();
        assert!((ctr - 1.5).abs() < 1e-9, "ctr was {}", ctr);
        assert_eq!(entry.winner(), Winner::B);
        assert_eq!(service.ledger(), outcome.ledger);
        assert_eq!(outcome.ledger.wins_for("a2"), 1);
    }
}
