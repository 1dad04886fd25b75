//! Patient intake
//!
//! The raw form as the patient filled it in, and the pure transform that
//! turns it into the payload used to open a conversation.

mod form;
mod snapshot;

pub use form::{DurationBucket, IntakeForm, Severity};
pub use snapshot::{assemble, IntakeSnapshot};

#[cfg(test)]
pub use form::SymptomEntry;

/// Sent in place of the symptom list when none were entered.
pub const NO_SYMPTOMS: &str = "No symptoms reported";

/// Sent in place of the representative duration when it is unknown.
pub const NO_DURATION: &str = "N/A";
