//! Derived ad metrics (ROAS, CTR, CPM).
//!
//! Each derivation returns `None` when the result would not be meaningful
//! (zero or missing denominator, or a quotient that overflows) instead of a
//! sentinel number. Inputs that are not finite numbers are coerced to `0` first.

use serde_json::Value;

use crate::types::CreativeRecord;

/// Coerce an optional input: present but non-finite becomes `0`.
#[inline]
fn coerce(v: Option<f64>) -> Option<f64> {
    v.map(|x| if x.is_finite() { x } else { 0.0 })
}

/// Coerce a JSON value to a number: numbers pass through, numeric strings are
/// parsed, anything else is `0`.
pub fn coerce_json_number(v: &Value) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

/// Optional JSON field: absent or `null` stays `None`, anything else coerces.
pub fn optional_json_number(v: Option<&Value>) -> Option<f64> {
    match v {
        None | Some(Value::Null) => None,
        Some(other) => Some(coerce_json_number(other)),
    }
}

/// ROAS = revenue / spend. Undefined unless `spend > 0`; negative or missing
/// revenue counts as zero.
pub fn derive_roas(revenue: Option<f64>, spend: Option<f64>) -> Option<f64> {
    let spend = coerce(spend).filter(|s| *s > 0.0)?;
    let revenue = coerce(revenue).unwrap_or(0.0).max(0.0);
    Some(revenue / spend).filter(|v| v.is_finite())
}

/// CTR in percent = clicks / impressions * 100. Undefined unless `impressions > 0`.
pub fn derive_ctr(clicks: Option<f64>, impressions: Option<f64>) -> Option<f64> {
    let impressions = coerce(impressions).filter(|i| *i > 0.0)?;
    let clicks = coerce(clicks).unwrap_or(0.0);
    Some(clicks / impressions * 100.0).filter(|v| v.is_finite())
}

/// CPM = spend / impressions * 1000. Undefined unless `impressions > 0`.
pub fn derive_cpm(spend: Option<f64>, impressions: Option<f64>) -> Option<f64> {
    let impressions = coerce(impressions).filter(|i| *i > 0.0)?;
    let spend = coerce(spend).unwrap_or(0.0);
    Some(spend / impressions * 1000.0).filter(|v| v.is_finite())
}

/// Fill in any metric the record lacks but its raw counters can produce.
///
/// Metrics that are already present are never overwritten. Returns how many
/// fields were filled.
pub fn enrich(record: &mut CreativeRecord) -> usize {
    let mut filled = 0;

    if record.roas.is_none() {
        record.roas = derive_roas(record.revenue, record.spend);
        filled += record.roas.is_some() as usize;
    }
    if record.ctr.is_none() {
        record.ctr = derive_ctr(record.clicks, record.impressions);
        filled += record.ctr.is_some() as usize;
    }
    if record.cpm.is_none() {
        record.cpm = derive_cpm(record.spend, record.impressions);
        filled += record.cpm.is_some() as usize;
    }

    filled
}
