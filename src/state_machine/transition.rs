//! Pure state transition function
//!
//! Each turn alternates between this function and the driver's effect
//! execution: the transition decides, the driver does I/O and feeds the
//! result back as the next event. Given the same state, configuration, and
//! event, the outputs are always the same.

use thiserror::Error;

use super::{Effect, Event, TurnState};
use crate::config::{NextTarget, ResolvedTarget, WorkflowConfig};
use crate::state_machine::state::{CompletedResult, SessionMetadata};

/// Result of a state transition.
#[derive(Debug)]
pub struct TransitionResult {
    pub next_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            next_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
#[allow(clippy::too_many_lines)]
pub fn transition(
    state: &TurnState,
    config: &WorkflowConfig,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Turn entry
        // ============================================================

        // A fresh run ignores the triggering message and starts by
        // resolving the form source.
        (TurnState::Entering, Event::TurnStarted { .. }) => {
            Ok(TransitionResult::new(TurnState::AcquiringForm).with_effect(Effect::AcquireForm))
        }

        // Mid-run, the input answers the pending question.
        (TurnState::AwaitingAnswer { session_id }, Event::TurnStarted { input }) => {
            let answer = input.unwrap_or_default().trim().to_string();
            Ok(TransitionResult::new(TurnState::SubmittingAnswer {
                session_id: session_id.clone(),
            })
            .with_effect(Effect::SubmitAnswer {
                session_id: session_id.clone(),
                answer,
            }))
        }

        // ============================================================
        // Form acquisition and session registration
        // ============================================================

        (TurnState::AcquiringForm, Event::FormAcquired { form }) => {
            Ok(TransitionResult::new(TurnState::Registering)
                .with_effect(Effect::RegisterForm { form }))
        }

        // Phase stays initial: the next input retries from scratch.
        (TurnState::AcquiringForm, Event::FormFailed) => {
            Ok(TransitionResult::new(TurnState::Done).with_effect(Effect::Reply {
                text: config.xform_message(),
            }))
        }

        (TurnState::Registering, Event::SessionRegistered { session_id }) => {
            Ok(TransitionResult::new(TurnState::FetchingFirstQuestion {
                session_id: session_id.clone(),
            })
            .with_effect(Effect::FetchFirstQuestion { session_id }))
        }

        (TurnState::Registering, Event::RegistrationFailed) => {
            Ok(TransitionResult::new(TurnState::Done).with_effect(Effect::Reply {
                text: config.service_message(),
            }))
        }

        // ============================================================
        // Question exchange
        // ============================================================

        (
            TurnState::FetchingFirstQuestion { session_id },
            Event::QuestionFetched {
                question: Some(question),
            },
        ) => Ok(show_question(session_id, question)),

        // A form with no questions completes immediately.
        (
            TurnState::FetchingFirstQuestion { session_id },
            Event::QuestionFetched { question: None },
        ) => Ok(complete(config, session_id)),

        (TurnState::FetchingFirstQuestion { .. }, Event::QuestionFailed) => {
            Ok(TransitionResult::new(TurnState::Done).with_effect(Effect::Reply {
                text: config.service_message(),
            }))
        }

        (
            TurnState::SubmittingAnswer { session_id },
            Event::AnswerAccepted {
                question: Some(question),
            },
        ) => Ok(show_question(session_id, question)),

        (TurnState::SubmittingAnswer { session_id }, Event::AnswerAccepted { question: None }) => {
            Ok(complete(config, session_id))
        }

        // Metadata is untouched: the pending question stays current and the
        // next input answers it again.
        (TurnState::SubmittingAnswer { .. }, Event::AnswerFailed) => {
            Ok(TransitionResult::new(TurnState::Done).with_effect(Effect::Reply {
                text: config.service_message(),
            }))
        }

        // ============================================================
        // Completion
        // ============================================================

        (TurnState::RetrievingResult { .. }, Event::ResultRetrieved { result }) => {
            let mut lead = Vec::new();
            if let Some(namespace) = &config.contact_namespace {
                lead.push(Effect::PersistResult {
                    namespace: namespace.clone(),
                    result: result.clone(),
                });
            }
            if config.results_url.is_some() {
                Ok(TransitionResult::new(TurnState::Forwarding {
                    result: result.clone(),
                })
                .with_effects(lead)
                .with_effect(Effect::ForwardResult { result }))
            } else {
                Ok(finish(config, Some(result), lead))
            }
        }

        (TurnState::RetrievingResult { .. }, Event::ResultFailed) => {
            Ok(TransitionResult::new(TurnState::Done).with_effect(Effect::Reply {
                text: config.service_message(),
            }))
        }

        (TurnState::Forwarding { result }, Event::ResultForwarded) => {
            Ok(finish(config, Some(result.clone()), Vec::new()))
        }

        // No successor transition: the error text is the turn's reply.
        (TurnState::Forwarding { .. }, Event::ForwardFailed) => {
            Ok(TransitionResult::new(TurnState::Done).with_effect(Effect::Reply {
                text: config.result_message(),
            }))
        }

        // ============================================================
        // Invalid transitions
        // ============================================================

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "no transition from {state:?} with event {event:?}"
        ))),
    }
}

/// Store the question as the pending display text and reply with it.
fn show_question(session_id: &str, question: String) -> TransitionResult {
    TransitionResult::new(TurnState::Done)
        .with_effect(Effect::SaveMetadata {
            metadata: SessionMetadata::awaiting(session_id, question.clone()),
        })
        .with_effect(Effect::Reply { text: question })
}

/// Entry into the completion path: retrieve the assembled result only when
/// something consumes it.
fn complete(config: &WorkflowConfig, session_id: &str) -> TransitionResult {
    if config.needs_result() {
        TransitionResult::new(TurnState::RetrievingResult {
            session_id: session_id.to_string(),
        })
        .with_effect(Effect::RetrieveResult {
            session_id: session_id.to_string(),
        })
    } else {
        finish(config, None, Vec::new())
    }
}

/// Resolve the successor and settle the turn.
fn finish(
    config: &WorkflowConfig,
    result: Option<CompletedResult>,
    lead: Vec<Effect>,
) -> TransitionResult {
    let settled = TransitionResult::new(TurnState::Done).with_effects(lead);
    match &config.next {
        None => settled
            .with_effect(Effect::SaveMetadata {
                metadata: SessionMetadata::default(),
            })
            .with_effect(Effect::Reply {
                text: String::new(),
            }),
        Some(next) => {
            let target = resolve_target(next, result.as_ref());
            settled.with_effect(Effect::GoTo { target })
        }
    }
}

fn resolve_target(next: &NextTarget, result: Option<&CompletedResult>) -> ResolvedTarget {
    match next {
        NextTarget::Name(name) => ResolvedTarget::named(name.clone()),
        NextTarget::WithParams { name, params } => {
            ResolvedTarget::with_params(name.clone(), params.clone())
        }
        NextTarget::Compute(f) => {
            // needs_result() guarantees the document was retrieved before a
            // computed successor is resolved.
            let fallback = CompletedResult::new("");
            f(result.unwrap_or(&fallback))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NextTarget;
    use serde_json::json;

    fn config_with_next() -> WorkflowConfig {
        WorkflowConfig {
            next: Some(NextTarget::name("states:end")),
            ..WorkflowConfig::default()
        }
    }

    #[test]
    fn entering_starts_with_form_acquisition() {
        let result = transition(
            &TurnState::Entering,
            &config_with_next(),
            Event::TurnStarted {
                input: Some("hi".to_string()),
            },
        )
        .unwrap();

        assert_eq!(result.next_state, TurnState::AcquiringForm);
        assert_eq!(result.effects, vec![Effect::AcquireForm]);
    }

    #[test]
    fn answers_are_trimmed_before_submission() {
        let state = TurnState::AwaitingAnswer {
            session_id: "s1".to_string(),
        };
        let result = transition(
            &state,
            &config_with_next(),
            Event::TurnStarted {
                input: Some("  Jon Snow \n".to_string()),
            },
        )
        .unwrap();

        assert_eq!(
            result.effects,
            vec![Effect::SubmitAnswer {
                session_id: "s1".to_string(),
                answer: "Jon Snow".to_string(),
            }]
        );
    }

    #[test]
    fn first_question_is_stored_and_replied() {
        let state = TurnState::FetchingFirstQuestion {
            session_id: "s1".to_string(),
        };
        let result = transition(
            &state,
            &config_with_next(),
            Event::QuestionFetched {
                question: Some("What is your name?".to_string()),
            },
        )
        .unwrap();

        assert_eq!(result.next_state, TurnState::Done);
        assert_eq!(
            result.effects,
            vec![
                Effect::SaveMetadata {
                    metadata: SessionMetadata::awaiting("s1", "What is your name?"),
                },
                Effect::Reply {
                    text: "What is your name?".to_string(),
                },
            ]
        );
    }

    #[test]
    fn final_answer_transitions_to_the_successor() {
        let state = TurnState::SubmittingAnswer {
            session_id: "s1".to_string(),
        };
        let result = transition(
            &state,
            &config_with_next(),
            Event::AnswerAccepted { question: None },
        )
        .unwrap();

        assert_eq!(
            result.effects,
            vec![Effect::GoTo {
                target: ResolvedTarget::named("states:end"),
            }]
        );
    }

    #[test]
    fn completion_retrieves_the_result_when_consumed() {
        let config = WorkflowConfig {
            contact_namespace: Some("registration".to_string()),
            ..config_with_next()
        };
        let state = TurnState::SubmittingAnswer {
            session_id: "s1".to_string(),
        };
        let result = transition(&state, &config, Event::AnswerAccepted { question: None }).unwrap();

        assert_eq!(
            result.next_state,
            TurnState::RetrievingResult {
                session_id: "s1".to_string()
            }
        );
        assert_eq!(
            result.effects,
            vec![Effect::RetrieveResult {
                session_id: "s1".to_string(),
            }]
        );
    }

    #[test]
    fn retrieved_result_is_persisted_then_forwarded() {
        let config = WorkflowConfig {
            contact_namespace: Some("registration".to_string()),
            results_url: Some("http://sink.test/submit".to_string()),
            ..config_with_next()
        };
        let state = TurnState::RetrievingResult {
            session_id: "s1".to_string(),
        };
        let document = CompletedResult::new("<data/>");
        let result = transition(
            &state,
            &config,
            Event::ResultRetrieved {
                result: document.clone(),
            },
        )
        .unwrap();

        assert_eq!(
            result.effects,
            vec![
                Effect::PersistResult {
                    namespace: "registration".to_string(),
                    result: document.clone(),
                },
                Effect::ForwardResult { result: document },
            ]
        );
    }

    #[test]
    fn forwarding_failure_replies_without_transitioning() {
        let config = WorkflowConfig {
            result_error_message: Some("delivery broke".to_string()),
            results_url: Some("http://sink.test/submit".to_string()),
            ..config_with_next()
        };
        let state = TurnState::Forwarding {
            result: CompletedResult::new("<data/>"),
        };
        let result = transition(&state, &config, Event::ForwardFailed).unwrap();

        assert_eq!(
            result.effects,
            vec![Effect::Reply {
                text: "delivery broke".to_string(),
            }]
        );
        assert!(!result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::GoTo { .. })));
    }

    #[test]
    fn computed_successor_sees_the_completed_result() {
        let config = WorkflowConfig {
            next: Some(NextTarget::compute(|result| {
                ResolvedTarget::with_params("states:report", json!({ "xml": result.as_str() }))
            })),
            ..WorkflowConfig::default()
        };
        let state = TurnState::RetrievingResult {
            session_id: "s1".to_string(),
        };
        let result = transition(
            &state,
            &config,
            Event::ResultRetrieved {
                result: CompletedResult::new("<data/>"),
            },
        )
        .unwrap();

        assert_eq!(
            result.effects,
            vec![Effect::GoTo {
                target: ResolvedTarget::with_params("states:report", json!({ "xml": "<data/>" })),
            }]
        );
    }

    #[test]
    fn missing_successor_resets_the_run() {
        let state = TurnState::SubmittingAnswer {
            session_id: "s1".to_string(),
        };
        let result = transition(
            &state,
            &WorkflowConfig::default(),
            Event::AnswerAccepted { question: None },
        )
        .unwrap();

        assert_eq!(
            result.effects,
            vec![
                Effect::SaveMetadata {
                    metadata: SessionMetadata::default(),
                },
                Effect::Reply {
                    text: String::new(),
                },
            ]
        );
    }

    #[test]
    fn failure_messages_fall_back_to_defaults() {
        let config = config_with_next();

        let acquisition = transition(&TurnState::AcquiringForm, &config, Event::FormFailed)
            .unwrap();
        assert_eq!(
            acquisition.effects,
            vec![Effect::Reply {
                text: "Error fetching the xform".to_string(),
            }]
        );

        let registration =
            transition(&TurnState::Registering, &config, Event::RegistrationFailed).unwrap();
        assert_eq!(
            registration.effects,
            vec![Effect::Reply {
                text: "Error contacting the xforms service".to_string(),
            }]
        );
    }

    #[test]
    fn configured_messages_override_defaults() {
        let config = WorkflowConfig {
            service_error_message: Some("service broke".to_string()),
            ..config_with_next()
        };
        let result = transition(&TurnState::Registering, &config, Event::RegistrationFailed)
            .unwrap();
        assert_eq!(
            result.effects,
            vec![Effect::Reply {
                text: "service broke".to_string(),
            }]
        );
    }

    #[test]
    fn mismatched_events_are_rejected() {
        let result = transition(
            &TurnState::Entering,
            &config_with_next(),
            Event::ResultForwarded,
        );
        assert!(matches!(
            result,
            Err(TransitionError::InvalidTransition(_))
        ));
    }
}
