//! Turn driver
//!
//! One invocation per user message: load the persisted metadata, seed the
//! in-turn state, then alternate pure transitions with effect execution until
//! the turn settles. Every outbound failure is logged here, once, with the
//! call-site tag; the transition supplies the user-facing fallback text.

use super::traits::{FormFetcher, FormsService, MetadataStore, ProfileStore, ResultsSink};
use crate::config::{ResolvedTarget, WorkflowConfig};
use crate::error::ConfigError;
use crate::source::{FormSource, RawForm};
use crate::state_machine::{transition, CompletedResult, Effect, Event, TurnState};

/// How a turn settled.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Show text to the user and wait for their next message.
    Reply(String),
    /// Hand control to the successor stage; the host discards this
    /// workflow's session metadata.
    Transition(ResolvedTarget),
}

/// Drives one form-filling workflow, one turn at a time.
///
/// Generic over the outbound client and the host-owned stores so the turn
/// loop can be exercised with mocks.
pub struct WorkflowRuntime<C, M, P> {
    config: WorkflowConfig,
    source: Option<FormSource>,
    resolved: Option<RawForm>,
    client: C,
    metadata: M,
    profile: P,
}

impl<C, M, P> WorkflowRuntime<C, M, P>
where
    C: FormsService + FormFetcher + ResultsSink,
    M: MetadataStore,
    P: ProfileStore,
{
    /// Construct a workflow runtime.
    ///
    /// Fails with [`ConfigError::MissingFormSource`] when the configuration
    /// carries neither `xform` nor `xform_url`.
    pub fn new(
        mut config: WorkflowConfig,
        client: C,
        metadata: M,
        profile: P,
    ) -> Result<Self, ConfigError> {
        let source = config.take_form_source()?;
        Ok(Self {
            config,
            source: Some(source),
            resolved: None,
            client,
            metadata,
            profile,
        })
    }

    /// Process one user turn.
    ///
    /// `input` is the user's message, absent on workflow entry. The turn
    /// always settles with an outcome; failures never propagate.
    pub async fn process_turn(&mut self, input: Option<&str>) -> TurnOutcome {
        let stored = match self.metadata.load().await {
            Ok(stored) => stored,
            Err(error) => {
                tracing::error!(error = %error, "failed to load session metadata");
                None
            }
        };
        let metadata = stored.unwrap_or_default();
        let mut state = TurnState::from_metadata(&metadata);

        // Redisplaying the pending text is the fallback if the turn settles
        // without an explicit reply.
        let mut outcome = TurnOutcome::Reply(metadata.pending_display_text);
        let mut pending = Some(Event::TurnStarted {
            input: input.map(str::to_string),
        });

        while let Some(event) = pending.take() {
            let result = match transition(&state, &self.config, event) {
                Ok(result) => result,
                Err(error) => {
                    tracing::error!(error = %error, "workflow turn aborted");
                    break;
                }
            };
            state = result.next_state;

            for effect in result.effects {
                match effect {
                    Effect::AcquireForm => pending = Some(self.acquire_form().await),
                    Effect::RegisterForm { form } => pending = Some(self.register(&form).await),
                    Effect::FetchFirstQuestion { session_id } => {
                        pending = Some(self.fetch_first_question(&session_id).await);
                    }
                    Effect::SubmitAnswer { session_id, answer } => {
                        pending = Some(self.submit_answer(&session_id, &answer).await);
                    }
                    Effect::RetrieveResult { session_id } => {
                        pending = Some(self.retrieve_result(&session_id).await);
                    }
                    Effect::ForwardResult { result } => {
                        pending = Some(self.forward_result(&result).await);
                    }
                    Effect::PersistResult { namespace, result } => {
                        // Best-effort: a failed profile write never blocks
                        // the successor.
                        if let Err(error) = self.profile.set_extra(&namespace, result.as_str()).await
                        {
                            tracing::error!(
                                error = %error,
                                namespace = %namespace,
                                "failed to persist completed result to profile"
                            );
                        }
                    }
                    Effect::SaveMetadata { metadata } => {
                        if let Err(error) = self.metadata.save(&metadata).await {
                            tracing::error!(error = %error, "failed to save session metadata");
                        }
                    }
                    Effect::Reply { text } => outcome = TurnOutcome::Reply(text),
                    Effect::GoTo { target } => outcome = TurnOutcome::Transition(target),
                }
            }
        }

        outcome
    }

    /// Resolve the form source, caching the document for the rest of the
    /// runtime's life so a retried run never re-resolves it.
    async fn acquire_form(&mut self) -> Event {
        if let Some(form) = &self.resolved {
            return Event::FormAcquired { form: form.clone() };
        }
        let Some(source) = self.source.take() else {
            tracing::error!("form source consumed without a resolved document");
            return Event::FormFailed;
        };

        // Only the remote branch can fail; keep a copy around so a later
        // turn can retry the fetch.
        let retry = match &source {
            FormSource::Remote {
                url,
                username,
                password,
            } => Some(FormSource::Remote {
                url: url.clone(),
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        match source.resolve(&self.client).await {
            Ok(form) => {
                self.resolved = Some(form.clone());
                Event::FormAcquired { form }
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to acquire the xform");
                self.source = retry;
                Event::FormFailed
            }
        }
    }

    async fn register(&self, form: &RawForm) -> Event {
        match self.client.register_form(form).await {
            Ok(session_id) => Event::SessionRegistered { session_id },
            Err(error) => {
                tracing::error!(error = %error, "failed to register the form with the xforms service");
                Event::RegistrationFailed
            }
        }
    }

    async fn fetch_first_question(&self, session_id: &str) -> Event {
        match self.client.first_question(session_id).await {
            Ok(question) => Event::QuestionFetched { question },
            Err(error) => {
                tracing::error!(error = %error, session_id, "failed to fetch the first question");
                Event::QuestionFailed
            }
        }
    }

    async fn submit_answer(&self, session_id: &str, answer: &str) -> Event {
        match self.client.submit_answer(session_id, answer).await {
            Ok(question) => Event::AnswerAccepted { question },
            Err(error) => {
                tracing::error!(error = %error, session_id, "failed to submit the answer");
                Event::AnswerFailed
            }
        }
    }

    async fn retrieve_result(&self, session_id: &str) -> Event {
        match self.client.completed_result(session_id).await {
            Ok(result) => Event::ResultRetrieved { result },
            Err(error) => {
                tracing::error!(error = %error, session_id, "failed to retrieve the completed result");
                Event::ResultFailed
            }
        }
    }

    async fn forward_result(&self, result: &CompletedResult) -> Event {
        let Some(results_url) = self.config.results_url.as_deref() else {
            tracing::error!("results forwarding requested without a results_url");
            return Event::ForwardFailed;
        };
        match self.client.submit(results_url, result).await {
            Ok(()) => Event::ResultForwarded,
            Err(error) => {
                tracing::error!(error = %error, url = %results_url, "failed to forward completed results");
                Event::ForwardFailed
            }
        }
    }
}
