//! Workflow construction parameters

use std::fmt;

use serde_json::Value;

use crate::error::ConfigError;
use crate::source::FormSource;
use crate::state_machine::CompletedResult;

/// Default xforms service host, used when no `service_url` is configured.
pub const DEFAULT_SERVICE_URL: &str = "https://xforms-service.fly.dev";

pub(crate) const DEFAULT_XFORM_ERROR: &str = "Error fetching the xform";
pub(crate) const DEFAULT_SERVICE_ERROR: &str = "Error contacting the xforms service";
pub(crate) const DEFAULT_RESULT_ERROR: &str = "Error, cannot submit results";

/// A fully resolved successor: the stage to hand control to, plus optional
/// creation parameters for its construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub name: String,
    pub params: Option<Value>,
}

impl ResolvedTarget {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: None,
        }
    }

    pub fn with_params(name: impl Into<String>, params: Value) -> Self {
        Self {
            name: name.into(),
            params: Some(params),
        }
    }
}

/// The configured successor, in one of its supported shapes.
///
/// `Compute` is invoked exactly once, with the completed result, at the
/// single point the successor is consumed.
pub enum NextTarget {
    /// A plain stage identifier.
    Name(String),
    /// A stage identifier with creation parameters.
    WithParams { name: String, params: Value },
    /// A function of the completed result.
    Compute(Box<dyn Fn(&CompletedResult) -> ResolvedTarget + Send + Sync>),
}

impl NextTarget {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn with_params(name: impl Into<String>, params: Value) -> Self {
        Self::WithParams {
            name: name.into(),
            params,
        }
    }

    pub fn compute(
        f: impl Fn(&CompletedResult) -> ResolvedTarget + Send + Sync + 'static,
    ) -> Self {
        Self::Compute(Box::new(f))
    }
}

impl fmt::Debug for NextTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::WithParams { name, params } => f
                .debug_struct("WithParams")
                .field("name", name)
                .field("params", params)
                .finish(),
            Self::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

/// Construction parameters for a form workflow.
///
/// Everything is optional except the form source: either `xform` or
/// `xform_url` must be set. When both are present `xform_url` wins.
#[derive(Debug)]
pub struct WorkflowConfig {
    /// Successor stage, resolved after the loop completes. When unset, the
    /// completed workflow resets and waits for a fresh run.
    pub next: Option<NextTarget>,
    /// Base URL of the xforms service.
    pub service_url: String,
    /// Override for the forms-service failure message.
    pub service_error_message: Option<String>,
    /// Literal, generated, or pending form document.
    pub xform: Option<FormSource>,
    /// URL to fetch the form document from, taking precedence over `xform`.
    pub xform_url: Option<String>,
    pub xform_url_username: Option<String>,
    pub xform_url_password: Option<String>,
    /// Override for the form-acquisition failure message.
    pub xform_error_message: Option<String>,
    /// Profile namespace to persist the completed result under.
    pub contact_namespace: Option<String>,
    /// Endpoint to forward the completed result to.
    pub results_url: Option<String>,
    /// Override for the results-submission failure message.
    pub result_error_message: Option<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            next: None,
            service_url: DEFAULT_SERVICE_URL.to_string(),
            service_error_message: None,
            xform: None,
            xform_url: None,
            xform_url_username: None,
            xform_url_password: None,
            xform_error_message: None,
            contact_namespace: None,
            results_url: None,
            result_error_message: None,
        }
    }
}

impl WorkflowConfig {
    /// Extract the effective form source, enforcing the construction
    /// precondition that one was supplied.
    pub(crate) fn take_form_source(&mut self) -> Result<FormSource, ConfigError> {
        if let Some(url) = self.xform_url.take() {
            return Ok(FormSource::Remote {
                url,
                username: self.xform_url_username.take(),
                password: self.xform_url_password.take(),
            });
        }
        self.xform.take().ok_or(ConfigError::MissingFormSource)
    }

    /// Whether the completion path has any consumer of the assembled result.
    pub(crate) fn needs_result(&self) -> bool {
        self.contact_namespace.is_some()
            || self.results_url.is_some()
            || matches!(self.next, Some(NextTarget::Compute(_)))
    }

    pub(crate) fn xform_message(&self) -> String {
        self.xform_error_message
            .clone()
            .unwrap_or_else(|| DEFAULT_XFORM_ERROR.to_string())
    }

    pub(crate) fn service_message(&self) -> String {
        self.service_error_message
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVICE_ERROR.to_string())
    }

    pub(crate) fn result_message(&self) -> String {
        self.result_error_message
            .clone()
            .unwrap_or_else(|| DEFAULT_RESULT_ERROR.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source_is_a_construction_error() {
        let mut config = WorkflowConfig::default();
        assert!(matches!(
            config.take_form_source(),
            Err(ConfigError::MissingFormSource)
        ));
    }

    #[test]
    fn xform_url_wins_over_inline_xform() {
        let mut config = WorkflowConfig {
            xform: Some(FormSource::inline("ignored")),
            xform_url: Some("http://forms.test/xform00".to_string()),
            xform_url_username: Some("user".to_string()),
            xform_url_password: Some("pass".to_string()),
            ..WorkflowConfig::default()
        };
        let source = config.take_form_source().unwrap();
        match source {
            FormSource::Remote { url, username, password } => {
                assert_eq!(url, "http://forms.test/xform00");
                assert_eq!(username.as_deref(), Some("user"));
                assert_eq!(password.as_deref(), Some("pass"));
            }
            other => panic!("expected a remote source, got {other:?}"),
        }
    }

    #[test]
    fn message_overrides_beat_defaults() {
        let config = WorkflowConfig {
            service_error_message: Some("custom service".to_string()),
            ..WorkflowConfig::default()
        };
        assert_eq!(config.service_message(), "custom service");
        assert_eq!(config.xform_message(), DEFAULT_XFORM_ERROR);
        assert_eq!(config.result_message(), DEFAULT_RESULT_ERROR);
    }

    #[test]
    fn result_is_needed_only_when_consumed() {
        assert!(!WorkflowConfig::default().needs_result());
        assert!(WorkflowConfig {
            contact_namespace: Some("registration".to_string()),
            ..WorkflowConfig::default()
        }
        .needs_result());
        assert!(WorkflowConfig {
            results_url: Some("http://sink.test/submit".to_string()),
            ..WorkflowConfig::default()
        }
        .needs_result());
        assert!(WorkflowConfig {
            next: Some(NextTarget::compute(|_| ResolvedTarget::named("end"))),
            ..WorkflowConfig::default()
        }
        .needs_result());
        assert!(!WorkflowConfig {
            next: Some(NextTarget::name("end")),
            ..WorkflowConfig::default()
        }
        .needs_result());
    }
}
