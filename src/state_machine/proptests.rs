//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::intake::{assemble, DurationBucket, IntakeForm, IntakeSnapshot, SymptomEntry};
use crate::transport::{ConversationHandle, Reply, StartOutcome, TerminalReport, TransportError};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_snapshot() -> impl Strategy<Value = IntakeSnapshot> {
    (
        proptest::collection::vec("[a-z]{3,10}", 0..4),
        "[0-9]{0,3}",
        proptest::option::of(0usize..DurationBucket::ALL.len()),
    )
        .prop_map(|(names, age, bucket)| {
            let mut form = IntakeForm::default();
            form.patient.age = age;
            form.symptoms = names.into_iter().map(SymptomEntry::new).collect();
            if let (Some(first), Some(i)) = (form.symptoms.first_mut(), bucket) {
                first.duration = Some(DurationBucket::ALL[i]);
            }
            assemble(&form)
        })
}

fn arb_report() -> impl Strategy<Value = TerminalReport> {
    ("[a-z]{1,12}", 0u32..100, any::<bool>()).prop_map(|(condition, confidence, alert)| {
        let mut analysis = json!({
            "ranked_diagnoses": [{ "condition": condition, "confidence": confidence }]
        });
        if alert {
            analysis["critical_alert"] = json!("Seek care now");
        }
        TerminalReport::new(json!({ "doctor_analysis": analysis }))
    })
}

fn arb_reply() -> impl Strategy<Value = Reply> {
    prop_oneof![
        "[a-zA-Z ?]{1,30}".prop_map(Reply::Question),
        arb_report().prop_map(Reply::Report),
    ]
}

fn arb_transport_error() -> impl Strategy<Value = TransportError> {
    prop_oneof![
        "[a-z ]{1,20}".prop_map(TransportError::network),
        "[a-z ]{1,20}".prop_map(TransportError::decode),
        "[a-z ]{1,20}".prop_map(TransportError::service),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_snapshot().prop_map(|snapshot| Event::StartRequested { snapshot }),
        "[a-zA-Z0-9 ]{0,20}".prop_map(|text| Event::UserAnswered { text }),
        Just(Event::Reset),
        ("c[0-9]{1,3}", arb_reply()).prop_map(|(id, reply)| Event::StartCompleted {
            outcome: StartOutcome {
                handle: ConversationHandle::new(id),
                reply,
            },
        }),
        arb_transport_error().prop_map(|error| Event::StartFailed { error }),
        arb_reply().prop_map(|reply| Event::ContinueCompleted { reply }),
        arb_transport_error().prop_map(|error| Event::ContinueFailed { error }),
    ]
}

/// Events a well-behaved runtime would feed for the current phase
fn driven_event(state: &Conversation, reply: Reply, failure: Option<TransportError>) -> Event {
    match (&state.phase, failure) {
        (Phase::Starting, Some(error)) => Event::StartFailed { error },
        (Phase::Starting, None) => Event::StartCompleted {
            outcome: StartOutcome {
                handle: ConversationHandle::new("c1"),
                reply,
            },
        },
        (Phase::Continuing { .. }, Some(error)) => Event::ContinueFailed { error },
        (Phase::Continuing { .. }, None) => Event::ContinueCompleted { reply },
        _ => Event::UserAnswered {
            text: "an answer".to_string(),
        },
    }
}

// ============================================================================
// Validity Checks
// ============================================================================

fn is_valid_state(state: &Conversation) -> bool {
    let messages = state.transcript.messages();
    match &state.phase {
        Phase::Idle | Phase::Starting => messages.is_empty(),
        Phase::AwaitingAnswer { .. } => {
            messages.first().map(|m| m.sender) == Some(Sender::Assistant)
        }
        Phase::Continuing { .. } => {
            messages.first().map(|m| m.sender) == Some(Sender::Assistant)
                && messages.last().map(|m| m.sender) == Some(Sender::User)
        }
        Phase::Resolved { .. } => {
            messages.is_empty() || messages.first().map(|m| m.sender) == Some(Sender::Assistant)
        }
    }
}

fn effects_are_valid(effects: &[Effect], state: &Conversation) -> bool {
    let requests = effects
        .iter()
        .filter(|e| matches!(e, Effect::RequestStart { .. } | Effect::RequestContinue { .. }))
        .count();
    if requests > 1 {
        return false;
    }

    effects.iter().all(|effect| match effect {
        Effect::RequestStart { .. } => state.phase == Phase::Starting,
        Effect::RequestContinue { handle, answer } => {
            matches!(&state.phase, Phase::Continuing { handle: h } if h == handle)
                && state.transcript.last() == Some(&Message::user(answer.clone()))
        }
        Effect::OpenDialogue => state.dialogue_open(),
        Effect::ShowResults => state.is_resolved(),
        Effect::CloseDialogue => !state.dialogue_open(),
        Effect::LogFailure { .. } => !state.is_busy(),
    })
}

fn is_prefix(old: &Transcript, new: &Transcript) -> bool {
    new.messages().starts_with(old.messages())
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Valid state and effects after any transition
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = Conversation::new();

        for event in events {
            match transition(&state, event) {
                Ok(result) => {
                    state = result.new_state;
                    prop_assert!(is_valid_state(&state), "Invalid state: {:?}", state);
                    prop_assert!(
                        effects_are_valid(&result.effects, &state),
                        "Invalid effects for state {:?}: {:?}",
                        state,
                        result.effects
                    );
                }
                Err(_) => { /* Invalid transition is OK */ }
            }
        }
    }

    // Invariant 2: The transcript only grows, except on start or reset
    #[test]
    fn prop_transcript_append_only(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = Conversation::new();

        for event in events {
            let clears = matches!(event, Event::StartRequested { .. } | Event::Reset);
            if let Ok(result) = transition(&state, event) {
                if !clears {
                    prop_assert!(
                        is_prefix(&state.transcript, &result.new_state.transcript),
                        "Transcript rewritten: {:?} -> {:?}",
                        state.transcript,
                        result.new_state.transcript
                    );
                }
                state = result.new_state;
            }
        }
    }

    // Invariant 3: Busy states reject answers and restarts
    #[test]
    fn prop_busy_rejects_submissions(
        events in proptest::collection::vec(arb_event(), 0..20),
        text in "[a-z]{1,10}",
        snapshot in arb_snapshot(),
    ) {
        let mut state = Conversation::new();
        for event in events {
            if let Ok(result) = transition(&state, event) {
                state = result.new_state;
            }
        }

        if state.is_busy() {
            prop_assert_eq!(
                transition(&state, Event::UserAnswered { text }).unwrap_err(),
                TransitionError::Busy
            );
            prop_assert_eq!(
                transition(&state, Event::StartRequested { snapshot }).unwrap_err(),
                TransitionError::Busy
            );
        }
    }

    // Invariant 4: Start yields exactly one of AwaitingAnswer or Resolved
    #[test]
    fn prop_start_outcome_exclusive(snapshot in arb_snapshot(), reply in arb_reply()) {
        let starting = transition(&Conversation::new(), Event::StartRequested { snapshot })
            .unwrap()
            .new_state;
        let state = transition(&starting, Event::StartCompleted {
            outcome: StartOutcome { handle: ConversationHandle::new("c1"), reply: reply.clone() },
        })
        .unwrap()
        .new_state;

        match reply {
            Reply::Question(q) => {
                prop_assert_eq!(state.phase.kind(), PhaseKind::AwaitingAnswer);
                prop_assert!(state.report().is_none());
                prop_assert_eq!(state.transcript.messages(), &[Message::assistant(q)]);
            }
            Reply::Report(report) => {
                prop_assert_eq!(state.report(), Some(&report));
                prop_assert!(state.transcript.is_empty());
                prop_assert!(!state.dialogue_open());
            }
        }
    }

    // Invariant 5: The stored report is exactly the last reply's report
    #[test]
    fn prop_report_round_trips(
        replies in proptest::collection::vec(arb_reply(), 1..10),
        failures in proptest::collection::vec(proptest::option::of(arb_transport_error()), 1..10),
    ) {
        let mut state = transition(&Conversation::new(), Event::StartRequested {
            snapshot: assemble(&IntakeForm::default()),
        })
        .unwrap()
        .new_state;

        let mut last_report = None;
        for (i, reply) in replies.into_iter().enumerate() {
            if state.is_resolved() {
                break;
            }
            let failure = failures.get(i).cloned().flatten();
            let event = driven_event(&state, reply, failure);
            if let Event::StartCompleted { outcome: StartOutcome { reply: Reply::Report(r), .. } }
                | Event::ContinueCompleted { reply: Reply::Report(r) } = &event
            {
                last_report = Some(r.clone());
            }
            if let Ok(result) = transition(&state, event) {
                state = result.new_state;
            }
        }

        prop_assert_eq!(state.report(), last_report.as_ref());
    }

    // Invariant 6: The busy flag tracks exactly one outstanding request
    #[test]
    fn prop_busy_iff_request_outstanding(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = Conversation::new();
        let mut outstanding = false;

        for event in events {
            let completes = matches!(
                event,
                Event::StartCompleted { .. }
                    | Event::StartFailed { .. }
                    | Event::ContinueCompleted { .. }
                    | Event::ContinueFailed { .. }
            );
            if let Ok(result) = transition(&state, event) {
                let issues = result.effects.iter().any(|e| {
                    matches!(e, Effect::RequestStart { .. } | Effect::RequestContinue { .. })
                });
                if issues {
                    prop_assert!(!outstanding, "Second request issued while one was outstanding");
                    outstanding = true;
                } else if completes {
                    outstanding = false;
                }
                state = result.new_state;
                prop_assert_eq!(state.is_busy(), outstanding);
            }
        }
    }
}
