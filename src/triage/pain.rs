//! Pain score coercion and the pain-to-tier step function

use crate::types::PriorityTier;
use serde_json::Value;

/// Pain at or above this is critical
pub const CRITICAL_PAIN_THRESHOLD: f64 = 8.0;
/// Pain at or above this (and below critical) is urgent
pub const URGENT_PAIN_THRESHOLD: f64 = 4.0;

/// Coerce a submitted pain value to a number.
///
/// JSON numbers are taken as-is and numeric strings are parsed. Anything else
/// (booleans, null, arrays, text, `NaN`) counts as 0. A submitted `0` stays `0`.
/// Out-of-range values such as `"Infinity"` or `"1e400"` saturate to the
/// largest finite score of the same sign.
pub fn coerce_pain_score(value: &Value) -> f64 {
    let score = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    score
        .filter(|s| !s.is_nan())
        .map(|s| s.clamp(f64::MIN, f64::MAX))
        .unwrap_or(0.0)
}

/// Map a pain score to its priority tier
pub fn tier_for_pain(score: f64) -> PriorityTier {
    if score >= CRITICAL_PAIN_THRESHOLD {
        PriorityTier::Critical
    } else if score >= URGENT_PAIN_THRESHOLD {
        PriorityTier::Urgent
    } else {
        PriorityTier::NonUrgent
    }
}

/// Stored pain level: the coerced score truncated toward zero
pub fn stored_pain_level(score: f64) -> i64 {
    score.trunc() as i64
}
