//! Core data model for the creative testing log.
//!
//! A [`CreativeRecord`] is a transient performance snapshot supplied per cycle.
//! A [`ComparisonEntry`] freezes two records and the verdict between them, and
//! a [`Ledger`] is the ordered, id-unique collection of those entries.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

// === Creative Records ===

/// One creative's performance snapshot.
///
/// Every metric is optional: `None` means "not measured yet" and is distinct
/// from a measured zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeRecord {
    /// Opaque creative identifier (ad or creative id)
    pub id: String,
    /// Display label
    #[serde(default)]
    pub name: String,
    /// Return on ad spend (revenue / spend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roas: Option<f64>,
    /// Click-through rate in percent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    /// Cost per thousand impressions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    /// Amount spent in account currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend: Option<f64>,
    /// Purchase conversions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchases: Option<f64>,
    /// Purchase revenue, the ROAS numerator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clicks: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impressions: Option<f64>,
}

impl CreativeRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_roas(mut self, roas: f64) -> Self {
        self.roas = Some(roas);
        self
    }

    pub fn with_ctr(mut self, ctr: f64) -> Self {
        self.ctr = Some(ctr);
        self
    }

    pub fn with_cpm(mut self, cpm: f64) -> Self {
        self.cpm = Some(cpm);
        self
    }

    pub fn with_spend(mut self, spend: f64) -> Self {
        self.spend = Some(spend);
        self
    }

    pub fn with_purchases(mut self, purchases: f64) -> Self {
        self.purchases = Some(purchases);
        self
    }

    /// Attach raw counters that metrics can be derived from
    pub fn with_counters(mut self, revenue: f64, clicks: f64, impressions: f64) -> Self {
        self.revenue = Some(revenue);
        self.clicks = Some(clicks);
        self.impressions = Some(impressions);
        self
    }

    /// Freeze the comparable metrics as they are right now.
    ///
    /// Non-finite values become `None`: JSON cannot carry them, and the winner
    /// rule already treats them as missing.
    pub fn snapshot(&self) -> MetricSnapshot {
        MetricSnapshot {
            roas: finite(self.roas),
            ctr: finite(self.ctr),
            cpm: finite(self.cpm),
            spend: finite(self.spend),
            purchases: finite(self.purchases),
        }
    }

    /// Same record with every non-finite metric or counter cleared to `None`
    pub fn finite_only(self) -> Self {
        Self {
            roas: finite(self.roas),
            ctr: finite(self.ctr),
            cpm: finite(self.cpm),
            spend: finite(self.spend),
            purchases: finite(self.purchases),
            revenue: finite(self.revenue),
            clicks: finite(self.clicks),
            impressions: finite(self.impressions),
            ..self
        }
    }
}

#[inline]
fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// Metrics captured at comparison time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spend: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchases: Option<f64>,
}

impl MetricSnapshot {
    /// ROAS as used by the winner rule: a missing or non-finite value counts
    /// as zero and stays comparable.
    #[inline]
    pub fn roas_for_comparison(&self) -> f64 {
        match self.roas {
            Some(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }
}

// === Comparison Entries ===

/// Verdict of a single A/B comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "tie")]
    Tie,
}

impl Winner {
    /// Strict ROAS comparison; equal values (including both missing) tie.
    pub fn decide(a: &MetricSnapshot, b: &MetricSnapshot) -> Self {
        let (ra, rb) = (a.roas_for_comparison(), b.roas_for_comparison());
        if ra > rb {
            Winner::A
        } else if rb > ra {
            Winner::B
        } else {
            Winner::Tie
        }
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Winner::A => "A",
            Winner::B => "B",
            Winner::Tie => "tie",
        })
    }
}

/// Separator between the two creative ids in an entry id
pub const COMPARISON_ID_SEPARATOR: &str = "_vs_";

/// Entry id for comparing `a_id` (as A) against `b_id` (as B).
///
/// Depends only on the two ids, so regenerating the same pairing always
/// yields the same id.
pub fn comparison_id(a_id: &str, b_id: &str) -> String {
    format!("{}{}{}", a_id, COMPARISON_ID_SEPARATOR, b_id)
}

/// Whether `id` can take part in [`comparison_id`] without ambiguity.
///
/// A creative id may not contain `_vs_`, end in `_vs`, or start with `vs_`.
/// Any of those lets two different pairs join into the same entry id, e.g.
/// (`x_vs_y`, `z`) and (`x`, `y_vs_z`).
pub fn is_pairable_id(id: &str) -> bool {
    let sep = COMPARISON_ID_SEPARATOR;
    !id.contains(sep) && !id.ends_with(&sep[..sep.len() - 1]) && !id.starts_with(&sep[1..])
}

/// Result of comparing exactly two creatives. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
    id: String,
    /// Unix milliseconds at construction
    created_at: i64,
    creative_a: CreativeRecord,
    creative_b: CreativeRecord,
    winner: Winner,
    metrics_a: MetricSnapshot,
    metrics_b: MetricSnapshot,
}

impl ComparisonEntry {
    /// Compare `a` against `b`, snapshotting both sides' metrics.
    ///
    /// Non-finite values are dropped from both records, so the stored entry
    /// survives a JSON round trip unchanged.
    pub fn new(a: CreativeRecord, b: CreativeRecord, created_at: i64) -> Self {
        let (a, b) = (a.finite_only(), b.finite_only());
        let metrics_a = a.snapshot();
        let metrics_b = b.snapshot();
        Self {
            id: comparison_id(&a.id, &b.id),
            created_at,
            winner: Winner::decide(&metrics_a, &metrics_b),
            creative_a: a,
            creative_b: b,
            metrics_a,
            metrics_b,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Creation time as a UTC datetime, if the stored millis are in range
    pub fn created_at_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis(self.created_at)
    }

    pub fn creative_a(&self) -> &CreativeRecord {
        &self.creative_a
    }

    pub fn creative_b(&self) -> &CreativeRecord {
        &self.creative_b
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    pub fn metrics_a(&self) -> &MetricSnapshot {
        &self.metrics_a
    }

    pub fn metrics_b(&self) -> &MetricSnapshot {
        &self.metrics_b
    }

    /// Id of the winning creative, `None` on a tie
    pub fn winning_creative_id(&self) -> Option<&str> {
        match self.winner {
            Winner::A => Some(&self.creative_a.id),
            Winner::B => Some(&self.creative_b.id),
            Winner::Tie => None,
        }
    }

    /// Equality on everything except `created_at`
    pub fn same_comparison(&self, other: &ComparisonEntry) -> bool {
        self.id == other.id
            && self.creative_a == other.creative_a
            && self.creative_b == other.creative_b
            && self.winner == other.winner
            && self.metrics_a == other.metrics_a
            && self.metrics_b == other.metrics_b
    }
}

// === Ledger ===

/// Counts from merging candidate entries into a ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub added: usize,
    pub skipped: usize,
}

/// Ordered comparison history; insertion order is creation order and ids are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ledger {
    entries: Vec<ComparisonEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from stored entries, keeping the first occurrence of any
    /// duplicated id.
    pub fn from_entries(entries: Vec<ComparisonEntry>) -> Self {
        let total = entries.len();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let entries: Vec<ComparisonEntry> = entries
            .into_iter()
            .filter(|e| seen.insert(e.id.clone()))
            .collect();

        if entries.len() < total {
            warn!(
                "[LEDGER] Dropped {} duplicate entries while loading",
                total - entries.len()
            );
        }

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ComparisonEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComparisonEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<ComparisonEntry> {
        self.entries
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&ComparisonEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Append candidates in order, skipping any whose id is already present.
    pub fn append_new(&mut self, candidates: Vec<ComparisonEntry>) -> MergeStats {
        let mut known: FxHashSet<String> = self.entries.iter().map(|e| e.id.clone()).collect();
        let mut stats = MergeStats::default();

        for entry in candidates {
            if known.insert(entry.id.clone()) {
                self.entries.push(entry);
                stats.added += 1;
            } else {
                stats.skipped += 1;
            }
        }

        stats
    }

    /// Number of comparisons the given creative won
    pub fn wins_for(&self, creative_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.winning_creative_id() == Some(creative_id))
            .count()
    }

    /// Up to `n` most recent entries, oldest first
    pub fn latest(&self, n: usize) -> &[ComparisonEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a ComparisonEntry;
    type IntoIter = std::slice::Iter<'a, ComparisonEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Ledger {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Ledger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<ComparisonEntry>::deserialize(deserializer).map(Ledger::from_entries)
    }
}

// =============================================================================
// TESTS
// =============================================================================
