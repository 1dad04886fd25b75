//! Intake snapshot assembly
//!
//! `assemble` is a pure function of the form: no I/O, no state. It degrades
//! leniently instead of failing:
//!
//! - age and weight that do not start with an integer are sent as `0`
//! - with no symptoms the list is sent as [`NO_SYMPTOMS`]
//! - only the first symptom's duration is forwarded, [`NO_DURATION`] when
//!   it is missing or unselected
//!
//! Height, respiratory rate and attachments stay on the form.

use super::{IntakeForm, NO_DURATION, NO_SYMPTOMS};
use serde::{Deserialize, Serialize};

/// Payload that opens a conversation. Built once, never re-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeSnapshot {
    pub patient_data: PatientData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientData {
    #[serde(rename = "Name")]
    pub name: String,
    pub age: i64,
    pub weight: i64,
    pub gender: String,
    pub blood_group: String,
    /// Comma-joined symptom names
    pub symptoms: String,
    /// Representative duration (first symptom only)
    pub duration: String,
    pub vitals: VitalsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsPayload {
    pub temperature: String,
    /// `systolic/diastolic`
    pub bp: String,
    pub pulse: String,
    pub spo2: String,
}

pub fn assemble(form: &IntakeForm) -> IntakeSnapshot {
    let symptoms = if form.symptoms.is_empty() {
        NO_SYMPTOMS.to_string()
    } else {
        form.symptoms
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let duration = form
        .symptoms
        .first()
        .and_then(|s| s.duration)
        .map_or_else(|| NO_DURATION.to_string(), |d| d.forwarded());

    let vitals = &form.vitals;

    IntakeSnapshot {
        patient_data: PatientData {
            name: form.patient.name.clone(),
            age: parse_lenient_int(&form.patient.age),
            weight: parse_lenient_int(&form.patient.weight),
            gender: form.patient.gender.clone(),
            blood_group: form.patient.blood_group.clone(),
            symptoms,
            duration,
            vitals: VitalsPayload {
                temperature: vitals.temperature.clone(),
                bp: format!("{}/{}", vitals.bp_systolic, vitals.bp_diastolic),
                pulse: vitals.pulse.clone(),
                spo2: vitals.spo2.clone(),
            },
        },
    }
}

/// Parse the leading integer of free-form text.
///
/// Leading whitespace and a sign are accepted, then the longest run of
/// digits is taken (`"72.5"` is 72, `"40kg"` is 40). Text without a leading
/// integer yields 0. Values beyond `i64` saturate.
pub fn parse_lenient_int(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        let d = i64::from(digit - b'0');
        value = match value.checked_mul(10).and_then(|v| v.checked_add(d)) {
            Some(v) => v,
            None => return if negative { i64::MIN } else { i64::MAX },
        };
    }

    if negative {
        -value
    } else {
        value
    }
}
