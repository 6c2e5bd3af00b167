//! Effects produced by state transitions

use crate::config::ResolvedTarget;
use crate::source::RawForm;
use crate::state_machine::state::{CompletedResult, SessionMetadata};

/// Effects to be executed by the turn driver after a transition.
///
/// Outbound-call effects produce the event that feeds the next transition;
/// `Reply` and `GoTo` settle the turn's outcome; the rest are fire-and-forget
/// writes to host collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Resolve the configured form source.
    AcquireForm,

    /// Register the raw form with the xforms service.
    RegisterForm { form: RawForm },

    /// Fetch the first question of a freshly created session.
    FetchFirstQuestion { session_id: String },

    /// Submit the trimmed answer for the pending question.
    SubmitAnswer { session_id: String, answer: String },

    /// Retrieve the assembled result after the last answer.
    RetrieveResult { session_id: String },

    /// Persist the completed result to the user's profile (best-effort).
    PersistResult {
        namespace: String,
        result: CompletedResult,
    },

    /// Forward the completed result to the configured results endpoint.
    ForwardResult { result: CompletedResult },

    /// Persist the new session metadata through the host.
    SaveMetadata { metadata: SessionMetadata },

    /// Show text to the user and end the turn.
    Reply { text: String },

    /// Hand control to the successor stage.
    GoTo { target: ResolvedTarget },
}
