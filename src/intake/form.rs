//! Raw intake form fields

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors loading an intake form from disk
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("failed to read intake form {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid intake form {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How long a symptom has been present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationBucket {
    #[serde(rename = "less_than_1_hour")]
    LessThanOneHour,
    #[serde(rename = "1_24_hours")]
    OneToTwentyFourHours,
    #[serde(rename = "1_7_days")]
    OneToSevenDays,
    #[serde(rename = "1_4_weeks")]
    OneToFourWeeks,
    #[serde(rename = "more_than_1_month")]
    MoreThanOneMonth,
}

impl DurationBucket {
    pub const ALL: [DurationBucket; 5] = [
        DurationBucket::LessThanOneHour,
        DurationBucket::OneToTwentyFourHours,
        DurationBucket::OneToSevenDays,
        DurationBucket::OneToFourWeeks,
        DurationBucket::MoreThanOneMonth,
    ];

    /// Wire code, as selected in the form
    pub fn code(self) -> &'static str {
        match self {
            DurationBucket::LessThanOneHour => "less_than_1_hour",
            DurationBucket::OneToTwentyFourHours => "1_24_hours",
            DurationBucket::OneToSevenDays => "1_7_days",
            DurationBucket::OneToFourWeeks => "1_4_weeks",
            DurationBucket::MoreThanOneMonth => "more_than_1_month",
        }
    }

    /// Human label shown next to the selector
    pub fn label(self) -> &'static str {
        match self {
            DurationBucket::LessThanOneHour => "Less than 1 hour",
            DurationBucket::OneToTwentyFourHours => "1-24 hours",
            DurationBucket::OneToSevenDays => "1-7 days",
            DurationBucket::OneToFourWeeks => "1-4 weeks",
            DurationBucket::MoreThanOneMonth => "More than 1 month",
        }
    }

    /// The text forwarded to the service: the code with underscores as spaces
    pub fn forwarded(self) -> String {
        self.code().replace('_', " ")
    }
}

impl FromStr for DurationBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DurationBucket::ALL
            .into_iter()
            .find(|bucket| bucket.code() == s)
            .ok_or_else(|| format!("unknown duration bucket: {s}"))
    }
}

impl fmt::Display for DurationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Symptom severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Mild,
    Moderate,
    Severe,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mild" => Ok(Severity::Mild),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        })
    }
}

/// One symptom as entered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomEntry {
    pub name: String,
    /// `None` until the patient picks a bucket
    #[serde(default, deserialize_with = "blank_as_none")]
    pub duration: Option<DurationBucket>,
    #[serde(default)]
    pub severity: Severity,
}

impl SymptomEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration: None,
            severity: Severity::default(),
        }
    }
}

#[cfg(test)]
impl SymptomEntry {
    pub fn with_duration(mut self, duration: DurationBucket) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Demographic fields, kept exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientFields {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub weight: String,
    pub height: String,
    pub blood_group: String,
}

/// Vital-sign fields, kept exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalFields {
    pub temperature: String,
    pub bp_systolic: String,
    pub bp_diastolic: String,
    pub spo2: String,
    pub pulse: String,
    pub respiratory_rate: String,
}

/// Uploaded documents. Collected with the form but never sent when a
/// conversation starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachments {
    pub lab_report: Option<PathBuf>,
    pub health_record: Option<PathBuf>,
}

/// The whole intake form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeForm {
    pub patient: PatientFields,
    pub symptoms: Vec<SymptomEntry>,
    pub vitals: VitalFields,
    pub attachments: Attachments,
}

impl IntakeForm {
    /// Load a form saved as JSON
    pub fn load(path: &Path) -> Result<Self, IntakeError> {
        let contents = std::fs::read_to_string(path).map_err(|source| IntakeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| IntakeError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Body-mass index from weight (kg) and height (cm), rounded to one decimal.
    pub fn bmi(&self) -> Option<f64> {
        let weight: f64 = self.patient.weight.trim().parse().ok()?;
        let height_cm: f64 = self.patient.height.trim().parse().ok()?;
        if weight <= 0.0 || height_cm <= 0.0 {
            return None;
        }
        let height_m = height_cm / 100.0;
        Some((weight / (height_m * height_m) * 10.0).round() / 10.0)
    }
}

/// Editing operations, driven by the terminal's intake commands
impl IntakeForm {
    /// Append a symptom with default severity and no duration.
    ///
    /// Blank names are ignored; returns whether a symptom was added.
    pub fn add_symptom(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.symptoms.push(SymptomEntry::new(name));
        true
    }

    pub fn remove_symptom(&mut self, index: usize) -> Option<SymptomEntry> {
        (index < self.symptoms.len()).then(|| self.symptoms.remove(index))
    }

    pub fn set_symptom_duration(&mut self, index: usize, duration: Option<DurationBucket>) -> bool {
        match self.symptoms.get_mut(index) {
            Some(symptom) => {
                symptom.duration = duration;
                true
            }
            None => false,
        }
    }

    pub fn set_symptom_severity(&mut self, index: usize, severity: Severity) -> bool {
        match self.symptoms.get_mut(index) {
            Some(symptom) => {
                symptom.severity = severity;
                true
            }
            None => false,
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<DurationBucket>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(code) => code.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
