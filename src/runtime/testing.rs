//! Mock implementations for testing
//!
//! These mocks enable turn-loop testing without real I/O: outbound calls pop
//! queued responses, and every call is recorded for assertion.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::traits::{FormFetcher, FormsService, MetadataStore, ProfileStore, ResultsSink};
use crate::error::{TransportError, WorkflowError};
use crate::source::RawForm;
use crate::state_machine::{CompletedResult, SessionMetadata};

fn no_response() -> WorkflowError {
    WorkflowError::Service(TransportError::network("no mock response queued"))
}

// ============================================================================
// Mock service client
// ============================================================================

/// Mock for the whole outbound surface: forms service, form fetching, and
/// results delivery.
#[derive(Default)]
pub struct MockService {
    register_responses: Mutex<VecDeque<Result<String, WorkflowError>>>,
    first_question_responses: Mutex<VecDeque<Result<Option<String>, WorkflowError>>>,
    answer_responses: Mutex<VecDeque<Result<Option<String>, WorkflowError>>>,
    result_responses: Mutex<VecDeque<Result<CompletedResult, WorkflowError>>>,
    fetch_responses: Mutex<VecDeque<Result<String, WorkflowError>>>,
    forward_responses: Mutex<VecDeque<Result<(), WorkflowError>>>,

    /// Record of registered form documents.
    pub registered_forms: Mutex<Vec<String>>,
    /// Record of sessions whose first question was requested.
    pub first_question_requests: Mutex<Vec<String>>,
    /// Record of submitted (session, answer) pairs.
    pub submitted_answers: Mutex<Vec<(String, String)>>,
    /// Record of sessions whose completed result was requested.
    pub result_requests: Mutex<Vec<String>>,
    /// Record of fetched (url, username, password) triples.
    pub fetch_requests: Mutex<Vec<(String, Option<String>, Option<String>)>>,
    /// Record of forwarded (url, document) pairs.
    pub forwarded: Mutex<Vec<(String, String)>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_register(&self, response: Result<String, WorkflowError>) {
        self.register_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_first_question(&self, response: Result<Option<String>, WorkflowError>) {
        self.first_question_responses
            .lock()
            .unwrap()
            .push_back(response);
    }

    pub fn queue_answer(&self, response: Result<Option<String>, WorkflowError>) {
        self.answer_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_result(&self, response: Result<CompletedResult, WorkflowError>) {
        self.result_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_fetch(&self, response: Result<String, WorkflowError>) {
        self.fetch_responses.lock().unwrap().push_back(response);
    }

    pub fn queue_forward(&self, response: Result<(), WorkflowError>) {
        self.forward_responses.lock().unwrap().push_back(response);
    }
}

#[async_trait]
impl FormsService for MockService {
    async fn register_form(&self, form: &RawForm) -> Result<String, WorkflowError> {
        self.registered_forms
            .lock()
            .unwrap()
            .push(form.as_str().to_string());
        self.register_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_response()))
    }

    async fn first_question(&self, session_id: &str) -> Result<Option<String>, WorkflowError> {
        self.first_question_requests
            .lock()
            .unwrap()
            .push(session_id.to_string());
        self.first_question_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_response()))
    }

    async fn submit_answer(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<Option<String>, WorkflowError> {
        self.submitted_answers
            .lock()
            .unwrap()
            .push((session_id.to_string(), answer.to_string()));
        self.answer_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_response()))
    }

    async fn completed_result(&self, session_id: &str) -> Result<CompletedResult, WorkflowError> {
        self.result_requests
            .lock()
            .unwrap()
            .push(session_id.to_string());
        self.result_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_response()))
    }
}

#[async_trait]
impl FormFetcher for MockService {
    async fn fetch(
        &self,
        url: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<String, WorkflowError> {
        self.fetch_requests.lock().unwrap().push((
            url.to_string(),
            username.map(str::to_string),
            password.map(str::to_string),
        ));
        self.fetch_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_response()))
    }
}

#[async_trait]
impl ResultsSink for MockService {
    async fn submit(
        &self,
        results_url: &str,
        document: &CompletedResult,
    ) -> Result<(), WorkflowError> {
        self.forwarded
            .lock()
            .unwrap()
            .push((results_url.to_string(), document.as_str().to_string()));
        self.forward_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_response()))
    }
}

// ============================================================================
// In-memory stores
// ============================================================================

/// In-memory session metadata store.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    metadata: Mutex<Option<SessionMetadata>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Option<SessionMetadata> {
        self.metadata.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn load(&self) -> Result<Option<SessionMetadata>, String> {
        Ok(self.metadata.lock().unwrap().clone())
    }

    async fn save(&self, metadata: &SessionMetadata) -> Result<(), String> {
        *self.metadata.lock().unwrap() = Some(metadata.clone());
        Ok(())
    }
}

/// Recording profile store with optional failure injection.
#[derive(Default)]
pub struct RecordingProfileStore {
    pub extras: Mutex<HashMap<String, String>>,
    failing: bool,
}

impl RecordingProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail.
    pub fn failing() -> Self {
        Self {
            extras: Mutex::new(HashMap::new()),
            failing: true,
        }
    }
}

#[async_trait]
impl ProfileStore for RecordingProfileStore {
    async fn set_extra(&self, namespace: &str, value: &str) -> Result<(), String> {
        if self.failing {
            return Err("profile store unavailable".to_string());
        }
        self.extras
            .lock()
            .unwrap()
            .insert(namespace.to_string(), value.to_string());
        Ok(())
    }
}
