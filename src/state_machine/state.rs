//! Workflow state types

use serde::{Deserialize, Serialize};

/// Persisted progress discriminant for a form-filling run.
///
/// This is the only cross-turn state the workflow owns: every invocation
/// re-derives what to do from the phase plus the current user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session yet; the next turn acquires the form and registers it.
    #[default]
    Initial,
    /// A question has been displayed; the next input answers it.
    AwaitingAnswer,
}

/// Per-conversation metadata, persisted by the host between invocations.
///
/// `session_id` is written together with the transition to
/// [`Phase::AwaitingAnswer`] and never mutated afterwards except by a fresh
/// run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub phase: Phase,
    #[serde(default)]
    pub session_id: String,
    /// Text shown to the user on the current turn, usually the pending
    /// question.
    #[serde(default)]
    pub pending_display_text: String,
}

impl SessionMetadata {
    /// Metadata for a session that has a question outstanding.
    pub fn awaiting(session_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            phase: Phase::AwaitingAnswer,
            session_id: session_id.into(),
            pending_display_text: question.into(),
        }
    }
}

/// The assembled final document, retrieved once the last answer is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedResult(String);

impl CompletedResult {
    pub fn new(document: impl Into<String>) -> Self {
        Self(document.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// In-turn machine state. Never persisted: each invocation seeds it from the
/// stored [`Phase`] and discards it when the turn settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnState {
    /// Start of an initial-phase turn.
    Entering,
    /// Resolving the form source.
    AcquiringForm,
    /// Registering the raw form with the service.
    Registering,
    /// Session created, first question in flight.
    FetchingFirstQuestion { session_id: String },
    /// Resumed mid-run: the stored question awaits its answer.
    AwaitingAnswer { session_id: String },
    /// The current answer is in flight.
    SubmittingAnswer { session_id: String },
    /// Loop finished, completed result in flight.
    RetrievingResult { session_id: String },
    /// Forwarding the completed result to the results endpoint.
    Forwarding { result: CompletedResult },
    /// Turn settled; a reply or successor transition has been emitted.
    Done,
}

impl TurnState {
    /// Seed the in-turn state from persisted metadata.
    pub fn from_metadata(metadata: &SessionMetadata) -> Self {
        match metadata.phase {
            Phase::Initial => Self::Entering,
            Phase::AwaitingAnswer => Self::AwaitingAnswer {
                session_id: metadata.session_id.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trips_through_json() {
        let metadata = SessionMetadata::awaiting("abc123", "What is your name?");
        let encoded = serde_json::to_string(&metadata).unwrap();
        assert!(encoded.contains("awaiting_answer"));
        let decoded: SessionMetadata = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn missing_fields_default_to_a_fresh_run() {
        let decoded: SessionMetadata = serde_json::from_str(r#"{"phase":"initial"}"#).unwrap();
        assert_eq!(decoded.phase, Phase::Initial);
        assert_eq!(decoded.session_id, "");
        assert_eq!(decoded.pending_display_text, "");
    }

    #[test]
    fn seeding_follows_the_stored_phase() {
        assert_eq!(
            TurnState::from_metadata(&SessionMetadata::default()),
            TurnState::Entering
        );
        assert_eq!(
            TurnState::from_metadata(&SessionMetadata::awaiting("abc123", "q")),
            TurnState::AwaitingAnswer {
                session_id: "abc123".to_string()
            }
        );
    }
}
