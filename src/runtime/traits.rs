//! Trait abstractions for turn-driver I/O
//!
//! These traits enable testing the driver with mock implementations. The
//! storage traits speak `Result<_, String>`: the host owns durability, this
//! component only reports what went wrong.

use async_trait::async_trait;

use crate::error::WorkflowError;
use crate::source::RawForm;
use crate::state_machine::{CompletedResult, SessionMetadata};

/// The JSON-speaking client of the remote xforms service.
#[async_trait]
pub trait FormsService: Send + Sync {
    /// Register a raw form document; returns the new session id.
    async fn register_form(&self, form: &RawForm) -> Result<String, WorkflowError>;

    /// Fetch the first question of a session. `None` means the form has no
    /// questions.
    async fn first_question(&self, session_id: &str) -> Result<Option<String>, WorkflowError>;

    /// Submit an answer; returns the next question, or `None` when the form
    /// is complete.
    async fn submit_answer(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<Option<String>, WorkflowError>;

    /// Retrieve the assembled result document of a completed session.
    async fn completed_result(&self, session_id: &str) -> Result<CompletedResult, WorkflowError>;
}

/// Plain HTTP retrieval of a form document from an arbitrary URL.
#[async_trait]
pub trait FormFetcher: Send + Sync {
    /// GET the document; credentials are attached when both are present.
    async fn fetch(
        &self,
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<String, WorkflowError>;
}

/// Delivery of the completed result to a results endpoint.
#[async_trait]
pub trait ResultsSink: Send + Sync {
    async fn submit(
        &self,
        results_url: &str,
        document: &CompletedResult,
    ) -> Result<(), WorkflowError>;
}

/// Host-owned storage for per-conversation session metadata.
///
/// Scoping to the conversation and durability across invocations are the
/// host's responsibility.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn load(&self) -> Result<Option<SessionMetadata>, String>;

    async fn save(&self, metadata: &SessionMetadata) -> Result<(), String>;
}

/// Host-owned storage for the current user's profile extras.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn set_extra(&self, namespace: &str, value: &str) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

use std::sync::Arc;

#[async_trait]
impl<T: FormsService + ?Sized> FormsService for Arc<T> {
    async fn register_form(&self, form: &RawForm) -> Result<String, WorkflowError> {
        (**self).register_form(form).await
    }

    async fn first_question(&self, session_id: &str) -> Result<Option<String>, WorkflowError> {
        (**self).first_question(session_id).await
    }

    async fn submit_answer(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<Option<String>, WorkflowError> {
        (**self).submit_answer(session_id, answer).await
    }

    async fn completed_result(&self, session_id: &str) -> Result<CompletedResult, WorkflowError> {
        (**self).completed_result(session_id).await
    }
}

#[async_trait]
impl<T: FormFetcher + ?Sized> FormFetcher for Arc<T> {
    async fn fetch(
        &self,
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<String, WorkflowError> {
        (**self).fetch(url, username, password).await
    }
}

#[async_trait]
impl<T: ResultsSink + ?Sized> ResultsSink for Arc<T> {
    async fn submit(
        &self,
        results_url: &str,
        document: &CompletedResult,
    ) -> Result<(), WorkflowError> {
        (**self).submit(results_url, document).await
    }
}

#[async_trait]
impl<T: MetadataStore + ?Sized> MetadataStore for Arc<T> {
    async fn load(&self) -> Result<Option<SessionMetadata>, String> {
        (**self).load().await
    }

    async fn save(&self, metadata: &SessionMetadata) -> Result<(), String> {
        (**self).save(metadata).await
    }
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    async fn set_extra(&self, namespace: &str, value: &str) -> Result<(), String> {
        (**self).set_extra(namespace, value).await
    }
}
