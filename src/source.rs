//! Creative data-source adapters.
//!
//! Turns already-fetched JSON into [`CreativeRecord`]s. Two shapes are
//! accepted: a plain array of creative objects, or a Meta Graph API insights
//! response (`{ "data": [ ...rows ], "paging": ... }`). Graph encodes numbers as
//! strings, so every numeric field goes through the coercion rules in
//! [`crate::metrics`].

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::LedgerError;
use crate::metrics::{coerce_json_number, optional_json_number};
use crate::types::CreativeRecord;

/// Purchase action types in precedence order. They overlap, so only the first
/// one present is used.
pub const PURCHASE_ACTION_TYPES: &[&str] = &[
    "omni_purchase",
    "purchase",
    "offsite_conversion.fb_pixel_purchase",
];

#[derive(Deserialize, Debug)]
struct ActionValue {
    action_type: String,
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize, Debug)]
struct CreativeRow {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    ad_id: Option<Value>,
    #[serde(default)]
    creative_id: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    ad_name: Option<Value>,

    #[serde(default)]
    roas: Option<Value>,
    #[serde(default)]
    ctr: Option<Value>,
    #[serde(default)]
    cpm: Option<Value>,
    #[serde(default)]
    spend: Option<Value>,
    #[serde(default)]
    purchases: Option<Value>,
    #[serde(default)]
    revenue: Option<Value>,
    #[serde(default)]
    clicks: Option<Value>,
    #[serde(default)]
    impressions: Option<Value>,

    // Graph insights action breakdowns
    #[serde(default)]
    purchase_roas: Option<Vec<ActionValue>>,
    #[serde(default)]
    actions: Option<Vec<ActionValue>>,
    #[serde(default)]
    action_values: Option<Vec<ActionValue>>,
}

fn text(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First purchase-type action value, coerced
fn purchase_value(actions: Option<&[ActionValue]>) -> Option<f64> {
    let actions = actions?;
    PURCHASE_ACTION_TYPES.iter().find_map(|kind| {
        actions
            .iter()
            .find(|a| a.action_type == *kind)
            .map(|a| coerce_json_number(&a.value))
    })
}

impl CreativeRow {
    fn into_record(self) -> CreativeRecord {
        let id = text(self.id.as_ref())
            .or_else(|| text(self.ad_id.as_ref()))
            .or_else(|| text(self.creative_id.as_ref()))
            .unwrap_or_default();
        let name = text(self.name.as_ref())
            .or_else(|| text(self.ad_name.as_ref()))
            .unwrap_or_default();

        // Explicit fields win over Graph action breakdowns
        CreativeRecord {
            id,
            name,
            roas: optional_json_number(self.roas.as_ref())
                .or_else(|| purchase_value(self.purchase_roas.as_deref())),
            ctr: optional_json_number(self.ctr.as_ref()),
            cpm: optional_json_number(self.cpm.as_ref()),
            spend: optional_json_number(self.spend.as_ref()),
            purchases: optional_json_number(self.purchases.as_ref())
                .or_else(|| purchase_value(self.actions.as_deref())),
            revenue: optional_json_number(self.revenue.as_ref())
                .or_else(|| purchase_value(self.action_values.as_deref())),
            clicks: optional_json_number(self.clicks.as_ref()),
            impressions: optional_json_number(self.impressions.as_ref()),
        }
    }
}

fn parse_rows(rows: &[Value]) -> Result<Vec<CreativeRecord>, LedgerError> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            if !row.is_object() {
                return Err(LedgerError::invalid_input(format!(
                    "creative at position {} is not an object",
                    idx
                )));
            }
            CreativeRow::deserialize(row)
                .map(CreativeRow::into_record)
                .map_err(|e| {
                    LedgerError::invalid_input(format!("creative at position {}: {}", idx, e))
                })
        })
        .collect()
}

/// Parse a creative batch from JSON, preserving input order.
pub fn parse_creatives(payload: &Value) -> Result<Vec<CreativeRecord>, LedgerError> {
    let records = match payload {
        Value::Array(rows) => parse_rows(rows)?,
        Value::Object(obj) => match obj.get("data") {
            Some(Value::Array(rows)) => parse_rows(rows)?,
            Some(_) => {
                return Err(LedgerError::invalid_input("insights 'data' is not an array"));
            }
            None => {
                return Err(LedgerError::invalid_input(
                    "expected a creative array or an insights payload with 'data'",
                ));
            }
        },
        other => {
            return Err(LedgerError::invalid_input(format!(
                "expected a creative array, got {}",
                json_kind(other)
            )));
        }
    };

    debug!("[SOURCE] Parsed {} creatives", records.len());
    Ok(records)
}

/// Parse the rows of a Graph insights response.
pub fn parse_insights(payload: &Value) -> Result<Vec<CreativeRecord>, LedgerError> {
    match payload.get("data") {
        Some(Value::Array(rows)) => parse_rows(rows),
        _ => Err(LedgerError::invalid_input("insights payload has no 'data' array")),
    }
}

/// Parse a creative batch from JSON text.
pub fn parse_creatives_str(text: &str) -> Result<Vec<CreativeRecord>, LedgerError> {
    let payload: Value = serde_json::from_str(text)
        .map_err(|e| LedgerError::invalid_input(format!("not valid JSON: {}", e)))?;
    parse_creatives(&payload)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
