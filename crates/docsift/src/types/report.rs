//! Validation report types with deterministic thresholding.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fraction of rules that must pass for a document to be valid, as tenths.
/// 6/10 keeps the arithmetic in integers.
const PASS_THRESHOLD_TENTHS: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RuleStatus {
    Pass,
    Fail,
}

impl TryFrom<String> for RuleStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "pass" | "passed" => Ok(Self::Pass),
            "fail" | "failed" => Ok(Self::Fail),
            other => Err(format!("unknown rule status: {other}")),
        }
    }
}

/// One rule's outcome as reported by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule: String,
    pub status: RuleStatus,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Validity {
    Valid,
    Invalid,
}

/// A full validation report.
///
/// `overall_validity` and `failed_rules` are always recomputed from the
/// per-rule results in code; the model's own verdict is kept only for
/// display as `model_verdict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: Vec<RuleResult>,
    pub overall_validity: Validity,
    pub failed_rules: Vec<RuleResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_verdict: Option<String>,
}

impl ValidationReport {
    /// Build a report from per-rule results, deriving the verdict.
    pub fn from_results(results: Vec<RuleResult>, model_verdict: Option<String>) -> Self {
        let mut report = Self {
            results,
            overall_validity: Validity::Invalid,
            failed_rules: Vec::new(),
            model_verdict,
        };
        report.recompute_validity();
        report
    }

    /// Parse a model's raw (already fence-stripped) JSON text into a report.
    ///
    /// Parsing is lenient about everything except the `results` array: extra
    /// keys are ignored, the model's `overall_validity` is captured as an
    /// opaque string, and individual malformed rule entries are dropped with
    /// a warning rather than failing the whole report.
    pub fn from_model_output(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw.trim())
            .map_err(|e| Error::model_response(format!("invalid JSON: {e}"), raw))?;

        let entries = value
            .get("results")
            .and_then(|r| r.as_array())
            .ok_or_else(|| Error::model_response("missing \"results\" array", raw))?;

        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<RuleResult>(entry.clone()) {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!("dropping malformed rule result: {e}");
                }
            }
        }

        let model_verdict = value.get("overall_validity").map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        Ok(Self::from_results(results, model_verdict))
    }

    /// Recompute `overall_validity` and `failed_rules` from `results`.
    ///
    /// Valid iff at least 60% of rules pass; an empty rule set is invalid.
    pub fn recompute_validity(&mut self) {
        let total = self.results.len();
        let passes = self
            .results
            .iter()
            .filter(|r| r.status == RuleStatus::Pass)
            .count();

        self.overall_validity = if total > 0 && passes * 10 >= total * PASS_THRESHOLD_TENTHS {
            Validity::Valid
        } else {
            Validity::Invalid
        };

        self.failed_rules = self
            .results
            .iter()
            .filter(|r| r.status == RuleStatus::Fail)
            .cloned()
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, status: RuleStatus) -> RuleResult {
        RuleResult {
            rule: name.to_string(),
            status,
            reason: String::new(),
        }
    }

    #[test]
    fn exactly_sixty_percent_is_valid() {
        let report = ValidationReport::from_results(
            vec![
                rule("a", RuleStatus::Pass),
                rule("b", RuleStatus::Pass),
                rule("c", RuleStatus::Pass),
                rule("d", RuleStatus::Fail),
                rule("e", RuleStatus::Fail),
            ],
            None,
        );
        assert_eq!(report.overall_validity, Validity::Valid);
        assert_eq!(report.failed_rules.len(), 2);
    }

    #[test]
    fn below_threshold_is_invalid() {
        let report = ValidationReport::from_results(
            vec![
                rule("a", RuleStatus::Pass),
                rule("b", RuleStatus::Fail),
                rule("c", RuleStatus::Fail),
                rule("d", RuleStatus::Fail),
            ],
            None,
        );
        assert_eq!(report.overall_validity, Validity::Invalid);
    }

    #[test]
    fn empty_rule_set_is_invalid() {
        let report = ValidationReport::from_results(Vec::new(), None);
        assert_eq!(report.overall_validity, Validity::Invalid);
    }

    #[test]
    fn verdict_ignores_model_claim() {
        // Model says VALID but only 1 of 3 rules passed.
        let raw = r#"{
            "results": [
                {"rule": "has date", "status": "pass", "reason": "found"},
                {"rule": "has amount", "status": "fail", "reason": "missing"},
                {"rule": "has sender", "status": "FAIL", "reason": "missing"}
            ],
            "overall_validity": "VALID"
        }"#;

        let report = ValidationReport::from_model_output(raw).unwrap();
        assert_eq!(report.overall_validity, Validity::Invalid);
        assert_eq!(report.model_verdict.as_deref(), Some("VALID"));
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let raw = r#"{
            "results": [
                {"rule": "ok", "status": "pass"},
                {"rule": "broken", "status": "maybe"}
            ]
        }"#;

        let report = ValidationReport::from_model_output(raw).unwrap();
        assert_eq!(report.results.len(), 1);
    }

    #[test]
    fn non_json_output_surfaces_raw_text() {
        let err = ValidationReport::from_model_output("I could not validate this").unwrap_err();
        match err {
            crate::error::Error::ModelResponse { raw, .. } => {
                assert!(raw.contains("could not validate"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
