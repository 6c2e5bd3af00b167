//! Conversational XForm filling workflow engine.
//!
//! Drives a multi-turn form-filling conversation against a remote xforms
//! service: acquire the form definition, register it to obtain a session,
//! relay the service's questions one turn at a time, and on completion
//! retrieve, persist, and forward the assembled result before handing
//! control to a successor stage.
//!
//! The host runtime owns message dispatch and durability; it hands each user
//! message to [`WorkflowRuntime::process_turn`] and acts on the returned
//! [`TurnOutcome`]. Cross-turn progress lives entirely in the persisted
//! [`SessionMetadata`], so every invocation re-derives its behavior from
//! that small state plus the current input.

pub mod client;
pub mod config;
pub mod error;
pub mod runtime;
pub mod source;
pub mod state_machine;

pub use client::HttpClient;
pub use config::{
    NextTarget, ResolvedTarget, WorkflowConfig, DEFAULT_SERVICE_URL,
};
pub use error::{ConfigError, TransportError, TransportErrorKind, WorkflowError};
pub use runtime::{
    FormFetcher, FormsService, MetadataStore, ProfileStore, ResultsSink, TurnOutcome,
    WorkflowRuntime,
};
pub use source::{FormSource, RawForm};
pub use state_machine::{CompletedResult, Phase, SessionMetadata};
