//! Canonical policy-input validation and assembly.

use crate::encode::encode;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Raw user-supplied fields, prior to validation.
///
/// `region_hash`, `crop_type_hash` and `parameter_type_hash` carry the raw
/// free text here (e.g. "NORTE"); the builder replaces them with their
/// decimal hash encodings. `trigger_above` and `current_timestamp` are the
/// two optional fields.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawPolicyFields {
    pub farmer_hash: String,
    pub coverage_amount: String,
    pub start_date: String,
    pub end_date: String,
    pub region_hash: String,
    pub crop_type_hash: String,
    pub parameter_type_hash: String,
    pub threshold_value: String,
    pub period_in_days: String,
    pub trigger_above: String,
    pub payout_percentage: String,
    pub current_timestamp: String,
}

/// The canonical ordered record fed to the circuit.
///
/// Field order matches `constants::INPUT_ORDER`. Numeric fields stay strings
/// here; coercion into field elements happens at the witness stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInput {
    pub farmer_hash: String,
    pub coverage_amount: String,
    pub start_date: String,
    pub end_date: String,
    pub region_hash: String,
    pub crop_type_hash: String,
    pub parameter_type_hash: String,
    pub threshold_value: String,
    pub period_in_days: String,
    pub trigger_above: String,
    pub payout_percentage: String,
    pub current_timestamp: String,
}

pub struct PolicyInputBuilder;

impl PolicyInputBuilder {
    /// Validate and assemble a `PolicyInput`, defaulting `current_timestamp`
    /// to the wall clock.
    pub fn build(raw: &RawPolicyFields) -> Result<PolicyInput, InputError> {
        Self::build_at(raw, Utc::now().timestamp())
    }

    /// Same as [`build`](Self::build) with an explicit clock value, so the
    /// timestamp default is testable.
    ///
    /// Validation is fail-fast: the first empty (after trimming) required
    /// field aborts with `MissingField` before any hashing happens.
    pub fn build_at(raw: &RawPolicyFields, now_unix: i64) -> Result<PolicyInput, InputError> {
        let required: [(&'static str, &str); 10] = [
            ("farmer_hash", &raw.farmer_hash),
            ("coverage_amount", &raw.coverage_amount),
            ("start_date", &raw.start_date),
            ("end_date", &raw.end_date),
            ("region_hash", &raw.region_hash),
            ("crop_type_hash", &raw.crop_type_hash),
            ("parameter_type_hash", &raw.parameter_type_hash),
            ("threshold_value", &raw.threshold_value),
            ("period_in_days", &raw.period_in_days),
            ("payout_percentage", &raw.payout_percentage),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(InputError::MissingField(name));
            }
        }

        let current_timestamp = if raw.current_timestamp.trim().is_empty() {
            now_unix.to_string()
        } else {
            raw.current_timestamp.clone()
        };

        Ok(PolicyInput {
            farmer_hash: raw.farmer_hash.clone(),
            coverage_amount: raw.coverage_amount.clone(),
            start_date: raw.start_date.clone(),
            end_date: raw.end_date.clone(),
            region_hash: encode(&raw.region_hash),
            crop_type_hash: encode(&raw.crop_type_hash),
            parameter_type_hash: encode(&raw.parameter_type_hash),
            threshold_value: raw.threshold_value.clone(),
            period_in_days: raw.period_in_days.clone(),
            trigger_above: normalize_trigger(&raw.trigger_above),
            payout_percentage: raw.payout_percentage.clone(),
            current_timestamp,
        })
    }
}

/// Canonicalize the optional boolean-as-string field. Anything that is not an
/// affirmative spelling counts as false, including blank.
fn normalize_trigger(raw: &str) -> String {
    match raw.trim() {
        "true" | "1" => "true".to_string(),
        _ => "false".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw() -> RawPolicyFields {
        RawPolicyFields {
            farmer_hash: "12345".to_string(),
            coverage_amount: "50000".to_string(),
            start_date: "1750000000".to_string(),
            end_date: "1750600000".to_string(),
            region_hash: "NORTE".to_string(),
            crop_type_hash: "SOJA".to_string(),
            parameter_type_hash: "chuva".to_string(),
            threshold_value: "120".to_string(),
            period_in_days: "30".to_string(),
            trigger_above: "true".to_string(),
            payout_percentage: "80".to_string(),
            current_timestamp: String::new(),
        }
    }

    #[test]
    fn build_hashes_free_text_fields() {
        let input = PolicyInputBuilder::build_at(&sample_raw(), 1_749_000_000).unwrap();
        assert_eq!(input.region_hash, encode("NORTE"));
        assert_eq!(input.crop_type_hash, encode("SOJA"));
        assert_eq!(input.parameter_type_hash, encode("chuva"));
        // Numeric fields pass through untouched.
        assert_eq!(input.coverage_amount, "50000");
        assert_eq!(input.start_date, "1750000000");
        assert_eq!(input.threshold_value, "120");
    }

    #[test]
    fn build_fails_fast_on_first_missing_field() {
        let mut raw = sample_raw();
        raw.coverage_amount = String::new();
        raw.end_date = String::new();
        let err = PolicyInputBuilder::build_at(&raw, 0).unwrap_err();
        assert_eq!(err, InputError::MissingField("coverage_amount"));
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        for field in [
            "farmer_hash",
            "coverage_amount",
            "start_date",
            "end_date",
            "region_hash",
            "crop_type_hash",
            "parameter_type_hash",
            "threshold_value",
            "period_in_days",
            "payout_percentage",
        ] {
            let mut raw = sample_raw();
            match field {
                "farmer_hash" => raw.farmer_hash = "  ".to_string(),
                "coverage_amount" => raw.coverage_amount = " \t".to_string(),
                "start_date" => raw.start_date = "\n".to_string(),
                "end_date" => raw.end_date = " ".to_string(),
                "region_hash" => raw.region_hash = "  ".to_string(),
                "crop_type_hash" => raw.crop_type_hash = " ".to_string(),
                "parameter_type_hash" => raw.parameter_type_hash = "   ".to_string(),
                "threshold_value" => raw.threshold_value = " ".to_string(),
                "period_in_days" => raw.period_in_days = "\t".to_string(),
                "payout_percentage" => raw.payout_percentage = " ".to_string(),
                _ => unreachable!(),
            }
            let err = PolicyInputBuilder::build_at(&raw, 0).unwrap_err();
            assert_eq!(err, InputError::MissingField(field), "field {field}");
        }
    }

    #[test]
    fn optional_fields_do_not_block_validation() {
        let mut raw = sample_raw();
        raw.trigger_above = String::new();
        raw.current_timestamp = String::new();
        let input = PolicyInputBuilder::build_at(&raw, 1_749_000_000).unwrap();
        assert_eq!(input.trigger_above, "false");
        assert_eq!(input.current_timestamp, "1749000000");
    }

    #[test]
    fn current_timestamp_defaults_only_when_blank() {
        let mut raw = sample_raw();
        raw.current_timestamp = "1748999999".to_string();
        let input = PolicyInputBuilder::build_at(&raw, 1_749_000_000).unwrap();
        assert_eq!(input.current_timestamp, "1748999999");
    }

    #[test]
    fn build_uses_wall_clock_for_default_timestamp() {
        let input = PolicyInputBuilder::build(&sample_raw()).unwrap();
        let ts: i64 = input.current_timestamp.parse().unwrap();
        // Sanity: a plausible Unix time, not zero or garbage.
        assert!(ts > 1_600_000_000);
    }

    #[test]
    fn trigger_above_normalization() {
        for (given, want) in [
            ("true", "true"),
            ("1", "true"),
            (" true ", "true"),
            ("false", "false"),
            ("0", "false"),
            ("", "false"),
            ("yes", "false"),
        ] {
            let mut raw = sample_raw();
            raw.trigger_above = given.to_string();
            let input = PolicyInputBuilder::build_at(&raw, 0).unwrap();
            assert_eq!(input.trigger_above, want, "given {given:?}");
        }
    }
}
