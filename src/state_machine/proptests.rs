//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::config::{NextTarget, WorkflowConfig};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_session_id() -> impl Strategy<Value = String> {
    "[a-z0-9]{8}".prop_map(String::from)
}

fn arb_state() -> impl Strategy<Value = TurnState> {
    prop_oneof![
        Just(TurnState::Entering),
        Just(TurnState::AcquiringForm),
        Just(TurnState::Registering),
        arb_session_id().prop_map(|session_id| TurnState::FetchingFirstQuestion { session_id }),
        arb_session_id().prop_map(|session_id| TurnState::AwaitingAnswer { session_id }),
        arb_session_id().prop_map(|session_id| TurnState::SubmittingAnswer { session_id }),
        arb_session_id().prop_map(|session_id| TurnState::RetrievingResult { session_id }),
        "[a-zA-Z<>/ ]{0,30}".prop_map(|doc| TurnState::Forwarding {
            result: CompletedResult::new(doc),
        }),
    ]
}

fn arb_failure_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::FormFailed),
        Just(Event::RegistrationFailed),
        Just(Event::QuestionFailed),
        Just(Event::AnswerFailed),
        Just(Event::ResultFailed),
        Just(Event::ForwardFailed),
    ]
}

fn arb_config() -> impl Strategy<Value = WorkflowConfig> {
    (
        proptest::option::of("[a-z:]{3,20}"),
        proptest::option::of("[a-zA-Z ]{1,30}"),
        proptest::option::of("[a-zA-Z ]{1,30}"),
        proptest::option::of("[a-zA-Z ]{1,30}"),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(next, xform_msg, service_msg, result_msg, namespace, results)| WorkflowConfig {
                next: next.map(NextTarget::name),
                xform_error_message: xform_msg,
                service_error_message: service_msg,
                result_error_message: result_msg,
                contact_namespace: namespace.then(|| "registration".to_string()),
                results_url: results.then(|| "http://sink.test/submit".to_string()),
                ..WorkflowConfig::default()
            },
        )
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: a failed call never reaches the successor, and the turn
    // still settles with exactly one reply.
    #[test]
    fn prop_failures_reply_and_never_transition(
        state in arb_state(),
        event in arb_failure_event(),
        config in arb_config(),
    ) {
        if let Ok(result) = transition(&state, &config, event) {
            prop_assert_eq!(&result.next_state, &TurnState::Done);
            prop_assert!(!result.effects.iter().any(|e| matches!(e, Effect::GoTo { .. })));
            let replies = result
                .effects
                .iter()
                .filter(|e| matches!(e, Effect::Reply { .. }))
                .count();
            prop_assert_eq!(replies, 1);
        }
    }

    // Invariant 2: answers are always submitted trimmed, against the session
    // from the resumed state.
    #[test]
    fn prop_answers_are_trimmed(
        session_id in arb_session_id(),
        input in "[ \t]{0,3}[a-zA-Z0-9 ]{0,20}[ \t\n]{0,3}",
    ) {
        let state = TurnState::AwaitingAnswer { session_id: session_id.clone() };
        let result = transition(
            &state,
            &WorkflowConfig::default(),
            Event::TurnStarted { input: Some(input.clone()) },
        )
        .unwrap();

        prop_assert_eq!(
            result.effects,
            vec![Effect::SubmitAnswer {
                session_id,
                answer: input.trim().to_string(),
            }]
        );
    }

    // Invariant 3: whenever metadata advances to awaiting_answer, the
    // session id is already set and the pending text equals the reply.
    #[test]
    fn prop_awaiting_metadata_is_complete(
        session_id in arb_session_id(),
        question in "[a-zA-Z ?]{1,40}",
        config in arb_config(),
        via_first_question in any::<bool>(),
    ) {
        let (state, event) = if via_first_question {
            (
                TurnState::FetchingFirstQuestion { session_id: session_id.clone() },
                Event::QuestionFetched { question: Some(question.clone()) },
            )
        } else {
            (
                TurnState::SubmittingAnswer { session_id: session_id.clone() },
                Event::AnswerAccepted { question: Some(question.clone()) },
            )
        };

        let result = transition(&state, &config, event).unwrap();

        let mut saved = None;
        let mut reply = None;
        for effect in &result.effects {
            match effect {
                Effect::SaveMetadata { metadata } => saved = Some(metadata.clone()),
                Effect::Reply { text } => reply = Some(text.clone()),
                _ => {}
            }
        }

        let saved = saved.expect("question display must persist metadata");
        prop_assert_eq!(saved.phase, Phase::AwaitingAnswer);
        prop_assert_eq!(&saved.session_id, &session_id);
        prop_assert_eq!(&saved.pending_display_text, &question);
        prop_assert_eq!(reply.as_deref(), Some(question.as_str()));
    }

    // Invariant 4: the completion path retrieves the result exactly when
    // something consumes it.
    #[test]
    fn prop_result_retrieved_only_when_consumed(
        session_id in arb_session_id(),
        config in arb_config(),
    ) {
        let state = TurnState::SubmittingAnswer { session_id };
        let result = transition(&state, &config, Event::AnswerAccepted { question: None }).unwrap();

        let retrieves = result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::RetrieveResult { .. }));
        prop_assert_eq!(retrieves, config.needs_result());
    }
}
