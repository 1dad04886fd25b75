//! Results view of a terminal report
//!
//! The report itself is opaque; this reads the fields the results view
//! knows how to show and falls back to a placeholder when they are missing.

use crate::transport::TerminalReport;
use serde::Deserialize;
use serde_json::Value;

/// Shown in place of the ranking until a report with diagnoses exists
pub const PLACEHOLDER_CONDITION: &str = "Waiting for AI Analysis...";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankedDiagnosis {
    pub condition: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default = "default_urgency")]
    pub urgency: String,
}

fn default_urgency() -> String {
    "low".to_string()
}

impl RankedDiagnosis {
    pub fn placeholder() -> Self {
        Self {
            condition: PLACEHOLDER_CONDITION.to_string(),
            confidence: 0.0,
            evidence: vec![],
            urgency: default_urgency(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub diagnoses: Vec<RankedDiagnosis>,
    pub critical_alert: Option<String>,
    /// False when the report carries no ranking and the placeholder is shown
    pub available: bool,
}

impl ReportView {
    pub fn from_report(report: Option<&TerminalReport>) -> Self {
        let analysis = report.and_then(|r| r.as_value().get("doctor_analysis"));

        // A missing ranking shows the placeholder; an empty one stays empty
        let diagnoses: Option<Vec<RankedDiagnosis>> = analysis
            .and_then(|a| a.get("ranked_diagnoses"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match RankedDiagnosis::deserialize(item) {
                        Ok(d) => Some(d),
                        Err(e) => {
                            tracing::warn!(error = %e, "Skipping malformed diagnosis entry");
                            None
                        }
                    })
                    .collect()
            });

        let critical_alert = analysis
            .and_then(|a| a.get("critical_alert"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match diagnoses {
            Some(diagnoses) => Self {
                diagnoses,
                critical_alert,
                available: true,
            },
            None => Self {
                diagnoses: vec![RankedDiagnosis::placeholder()],
                critical_alert,
                available: false,
            },
        }
    }
}
