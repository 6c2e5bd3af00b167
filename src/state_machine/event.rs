//! Events that advance a turn

use crate::source::RawForm;
use crate::state_machine::state::CompletedResult;

/// Events that trigger state transitions.
///
/// `TurnStarted` carries the user's message for this invocation; the rest
/// report the outcome of an outbound call the driver just executed. Failure
/// events carry no payload: the driver has already logged the cause, and the
/// transition only needs the call site (encoded by the current state) to
/// select the fallback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The host delivered a user message (absent on workflow entry).
    TurnStarted { input: Option<String> },

    // Form acquisition
    FormAcquired { form: RawForm },
    FormFailed,

    // Session registration
    SessionRegistered { session_id: String },
    RegistrationFailed,

    // Question exchange
    QuestionFetched { question: Option<String> },
    QuestionFailed,
    AnswerAccepted { question: Option<String> },
    AnswerFailed,

    // Completion
    ResultRetrieved { result: CompletedResult },
    ResultFailed,
    ResultForwarded,
    ForwardFailed,
}
