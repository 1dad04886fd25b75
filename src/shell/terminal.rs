//! Line-oriented terminal front-end
//!
//! Reads answers from an async line source and writes the dialogue and
//! results to any `io::Write`. All rendering is done by the pure
//! `render_*` functions below.

use super::view::{ShellModel, View};
use crate::intake::{assemble, DurationBucket, IntakeForm, IntakeSnapshot, Severity};
use crate::report::ReportView;
use crate::runtime::{RuntimeHandle, ShellEvent};
use crate::state_machine::{Conversation, Message, Operation, PhaseKind, Sender};
use std::fmt::Write as _;
use std::io::{self, Write};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast;

const QUIT: &str = ":quit";
const RESET: &str = ":reset";

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Conversation runtime stopped")]
    RuntimeStopped,
}

pub struct TerminalShell<W: Write> {
    handle: RuntimeHandle,
    form: IntakeForm,
    snapshot: IntakeSnapshot,
    out: W,
    model: ShellModel,
    /// Transcript messages already written
    shown: usize,
}

impl<W: Write> TerminalShell<W> {
    pub fn new(handle: RuntimeHandle, form: IntakeForm, snapshot: IntakeSnapshot, out: W) -> Self {
        Self {
            handle,
            form,
            snapshot,
            out,
            model: ShellModel::from(&Conversation::new()),
            shown: 0,
        }
    }

    /// Run one session: submit the intake, hold the dialogue, print results.
    ///
    /// Returns when the conversation resolves, on `:quit`, or at end of input.
    pub async fn run<R>(mut self, input: R) -> Result<(), ShellError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut events = self.handle.subscribe();
        let mut lines = input.lines();

        write!(self.out, "{}", render_intake(&self.form, &self.snapshot))?;
        writeln!(self.out, "Submitting intake...")?;
        self.out.flush()?;
        self.submit_start().await?;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        if self.apply(event)? {
                            return Ok(());
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Shell lagged behind runtime events");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(ShellError::RuntimeStopped);
                    }
                },
                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.handle_line(&line).await? {
                            return Ok(());
                        }
                    }
                    None => {
                        tracing::debug!("End of input");
                        return Ok(());
                    }
                },
            }
            self.out.flush()?;
        }
    }

    /// Returns true once the results view has been shown
    fn apply(&mut self, event: ShellEvent) -> Result<bool, ShellError> {
        match event {
            ShellEvent::StateChanged { model } => {
                match &model.dialogue {
                    Some(dialogue) => {
                        for message in dialogue.messages.iter().skip(self.shown) {
                            if message.sender == Sender::Assistant {
                                writeln!(self.out, "{}", render_message(message))?;
                            }
                        }
                        self.shown = dialogue.messages.len();
                    }
                    None => self.shown = 0,
                }

                let resolved = model.view == View::Results;
                if resolved {
                    let results = render_results(&self.form, &self.snapshot, &model.report_view());
                    write!(self.out, "{results}")?;
                }
                self.model = model;
                Ok(resolved)
            }
            ShellEvent::DialogueOpened => {
                writeln!(
                    self.out,
                    "--- Follow-up questions ({RESET} to start over, {QUIT} to leave) ---"
                )?;
                Ok(false)
            }
            ShellEvent::DialogueClosed => {
                writeln!(self.out, "--- Dialogue closed ---")?;
                Ok(false)
            }
            ShellEvent::ResultsReady => Ok(false),
            ShellEvent::RequestFailed { operation, message } => {
                writeln!(self.out, "Request failed: {message}")?;
                match operation {
                    Operation::Start => {
                        writeln!(self.out, "Press enter to submit the intake again.")?;
                    }
                    Operation::Continue => {
                        writeln!(self.out, "Your answer was not delivered. Type it again.")?;
                    }
                }
                Ok(false)
            }
            ShellEvent::Rejected { message } => {
                writeln!(self.out, "Not accepted: {message}")?;
                Ok(false)
            }
        }
    }

    /// Returns false when the user asked to leave
    async fn handle_line(&mut self, line: &str) -> Result<bool, ShellError> {
        let line = line.trim();
        if line == QUIT {
            return Ok(false);
        }
        if self.model.busy {
            writeln!(self.out, "Waiting for the service, input ignored.")?;
            return Ok(true);
        }
        if line == RESET {
            self.handle
                .reset()
                .await
                .map_err(|_| ShellError::RuntimeStopped)?;
            writeln!(self.out, "Conversation reset. Press enter to submit the intake again.")?;
            return Ok(true);
        }

        if let Some(command) = line.strip_prefix(':') {
            return self.handle_intake_command(command);
        }

        match self.model.phase {
            PhaseKind::Idle => {
                writeln!(self.out, "Submitting intake...")?;
                self.submit_start().await?;
            }
            PhaseKind::AwaitingAnswer => {
                if line.is_empty() {
                    writeln!(self.out, "Please type an answer.")?;
                } else {
                    self.handle
                        .answer(line)
                        .await
                        .map_err(|_| ShellError::RuntimeStopped)?;
                }
            }
            PhaseKind::Starting | PhaseKind::Continuing | PhaseKind::Resolved => {}
        }
        Ok(true)
    }

    /// `:add`, `:remove`, `:duration` and `:severity` edit the intake.
    /// Only allowed while no conversation is open; the next submission
    /// carries the edited form.
    fn handle_intake_command(&mut self, command: &str) -> Result<bool, ShellError> {
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, arg)| (name, arg.trim()));

        if !matches!(name, "add" | "remove" | "duration" | "severity") {
            writeln!(self.out, "Unknown command :{name}")?;
            return Ok(true);
        }
        if self.model.phase != PhaseKind::Idle {
            writeln!(
                self.out,
                "The intake can only be edited before it is submitted ({RESET} first)."
            )?;
            return Ok(true);
        }

        match edit_intake(&mut self.form, name, arg) {
            Ok(()) => {
                self.snapshot = assemble(&self.form);
                tracing::debug!(command = name, "Intake edited");
                write!(self.out, "{}", render_intake(&self.form, &self.snapshot))?;
                writeln!(self.out, "Press enter to submit the intake.")?;
            }
            Err(message) => writeln!(self.out, "{message}")?,
        }
        Ok(true)
    }

    async fn submit_start(&self) -> Result<(), ShellError> {
        self.handle
            .start(self.snapshot.clone())
            .await
            .map_err(|_| ShellError::RuntimeStopped)
    }
}

/// Apply one intake command. Symptom numbers are 1-based as listed.
fn edit_intake(form: &mut IntakeForm, name: &str, arg: &str) -> Result<(), String> {
    let symptom_index = |raw: Option<&str>| -> Result<usize, String> {
        raw.and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| format!("Expected a symptom number, got {:?}", raw.unwrap_or("")))
    };
    let mut parts = arg.split_whitespace();

    match name {
        "add" => {
            if form.add_symptom(arg) {
                Ok(())
            } else {
                Err("Usage: :add <symptom>".to_string())
            }
        }
        "remove" => {
            let index = symptom_index(parts.next())?;
            form.remove_symptom(index)
                .map(|_| ())
                .ok_or_else(|| format!("No symptom number {}", index + 1))
        }
        "duration" => {
            let index = symptom_index(parts.next())?;
            let duration = match parts.next() {
                None | Some("none") => None,
                Some(code) => Some(code.parse::<DurationBucket>()?),
            };
            if form.set_symptom_duration(index, duration) {
                Ok(())
            } else {
                Err(format!("No symptom number {}", index + 1))
            }
        }
        "severity" => {
            let index = symptom_index(parts.next())?;
            let severity = parts
                .next()
                .ok_or_else(|| "Usage: :severity <n> mild|moderate|severe".to_string())?
                .parse::<Severity>()?;
            if form.set_symptom_severity(index, severity) {
                Ok(())
            } else {
                Err(format!("No symptom number {}", index + 1))
            }
        }
        _ => Err(format!("Unknown command :{name}")),
    }
}

fn or_na(value: &str) -> &str {
    let value = value.trim();
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

pub fn render_message(message: &Message) -> String {
    match message.sender {
        Sender::Assistant => format!("Doctor: {}", message.text),
        Sender::User => format!("You: {}", message.text),
    }
}

pub fn render_intake(form: &IntakeForm, snapshot: &IntakeSnapshot) -> String {
    let patient = &form.patient;
    let mut out = String::new();
    let _ = writeln!(out, "Patient: {}", or_na(&patient.name));
    let _ = writeln!(
        out,
        "Age: {}  Gender: {}  Blood group: {}",
        or_na(&patient.age),
        or_na(&patient.gender),
        or_na(&patient.blood_group)
    );
    if form.symptoms.is_empty() {
        let _ = writeln!(out, "Symptoms: {}", snapshot.patient_data.symptoms);
    } else {
        let _ = writeln!(out, "Symptoms:");
        for symptom in &form.symptoms {
            let duration = symptom.duration.map_or("duration not given", |d| d.label());
            let _ = writeln!(out, "  - {} ({duration}, {})", symptom.name, symptom.severity);
        }
    }
    out
}

pub fn render_results(form: &IntakeForm, snapshot: &IntakeSnapshot, report: &ReportView) -> String {
    let data = &snapshot.patient_data;
    let vitals = &form.vitals;
    let mut out = String::new();

    if let Some(alert) = &report.critical_alert {
        let _ = writeln!(out, "!! Critical Alert: Immediate Attention Required");
        let _ = writeln!(out, "!! {alert}");
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Differential Diagnoses");
    for (i, diagnosis) in report.diagnoses.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} ({}% confidence, {} urgency)",
            i + 1,
            diagnosis.condition,
            diagnosis.confidence,
            diagnosis.urgency
        );
        for item in &diagnosis.evidence {
            let _ = writeln!(out, "     - {item}");
        }
    }
    let _ = writeln!(out);

    let bmi = form
        .bmi()
        .map_or_else(|| "N/A".to_string(), |b| format!("{b:.1}"));
    let _ = writeln!(out, "Patient Summary");
    let _ = writeln!(out, "  Age: {} years", or_na(&form.patient.age));
    let _ = writeln!(out, "  Gender: {}", or_na(&form.patient.gender));
    let _ = writeln!(out, "  BMI: {bmi}");
    let _ = writeln!(out, "  Primary Symptoms: {}", data.symptoms);
    let _ = writeln!(out, "  Duration: {}", data.duration);
    let _ = writeln!(out);

    let _ = writeln!(out, "Current Vitals");
    let _ = writeln!(out, "  Temperature: {} °F", or_na(&vitals.temperature));
    let _ = writeln!(
        out,
        "  Blood Pressure: {}/{}",
        or_na(&vitals.bp_systolic),
        or_na(&vitals.bp_diastolic)
    );
    let _ = writeln!(out, "  Heart Rate: {} bpm", or_na(&vitals.pulse));
    let _ = writeln!(out, "  SpO2: {}%", or_na(&vitals.spo2));
    let _ = writeln!(out, "  Respiratory Rate: {}", or_na(&vitals.respiratory_rate));
    out
}
