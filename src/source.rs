//! Form definition sourcing
//!
//! A workflow can be handed its form definition in several shapes: a literal
//! document, a closure, an in-flight computation, or a URL to fetch it from.
//! Whatever the shape, it is resolved exactly once, at the start of a run,
//! into a [`RawForm`].

use std::fmt;

use futures::future::BoxFuture;

use crate::error::WorkflowError;
use crate::runtime::FormFetcher;

/// An opaque raw form document, as handed to the forms service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForm(String);

impl RawForm {
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

/// Where the form definition comes from.
///
/// Consumed by [`FormSource::resolve`]; construction happens through the
/// helper constructors so callers never spell out the boxed shapes.
pub enum FormSource {
    /// A literal document, used as-is.
    Inline(String),
    /// A zero-argument producer, invoked once.
    Provider(Box<dyn Fn() -> String + Send + Sync>),
    /// An asynchronous computation, awaited once.
    Pending(BoxFuture<'static, String>),
    /// A document fetched from a remote URL, with optional basic auth.
    Remote {
        url: String,
        username: Option<String>,
        password: Option<String>,
    },
}

impl FormSource {
    pub fn inline(document: impl Into<String>) -> Self {
        Self::Inline(document.into())
    }

    pub fn provider(producer: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self::Provider(Box::new(producer))
    }

    pub fn pending(
        computation: impl std::future::Future<Output = String> + Send + 'static,
    ) -> Self {
        Self::Pending(Box::pin(computation))
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote {
            url: url.into(),
            username: None,
            password: None,
        }
    }

    pub fn remote_with_auth(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::Remote {
            url: url.into(),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Resolve this source into a raw form document.
    ///
    /// Only the `Remote` variant touches the network; credentials are
    /// attached when both username and password are present.
    pub async fn resolve<F>(self, fetcher: &F) -> Result<RawForm, WorkflowError>
    where
        F: FormFetcher + ?Sized,
    {
        match self {
            Self::Inline(document) => Ok(RawForm(document)),
            Self::Provider(producer) => Ok(RawForm(producer())),
            Self::Pending(computation) => Ok(RawForm(computation.await)),
            Self::Remote {
                url,
                username,
                password,
            } => {
                let document = fetcher
                    .fetch(&url, username.as_deref(), password.as_deref())
                    .await?;
                Ok(RawForm(document))
            }
        }
    }
}

impl fmt::Debug for FormSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(document) => f.debug_tuple("Inline").field(document).finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
            Self::Pending(_) => f.write_str("Pending(..)"),
            Self::Remote { url, username, .. } => f
                .debug_struct("Remote")
                .field("url", url)
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;

    struct RejectingFetcher;

    #[async_trait]
    impl FormFetcher for RejectingFetcher {
        async fn fetch(
            &self,
            _url: &str,
            _username: Option<&str>,
            _password: Option<&str>,
        ) -> Result<String, WorkflowError> {
            Err(WorkflowError::Acquisition(TransportError::status(
                500,
                "boom",
            )))
        }
    }

    #[tokio::test]
    async fn inline_resolves_without_fetching() {
        let form = FormSource::inline("<form/>")
            .resolve(&RejectingFetcher)
            .await
            .unwrap();
        assert_eq!(form.as_str(), "<form/>");
    }

    #[tokio::test]
    async fn equal_literal_sources_resolve_equal() {
        let a = FormSource::inline("<form/>").resolve(&RejectingFetcher).await;
        let b = FormSource::inline("<form/>").resolve(&RejectingFetcher).await;
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn provider_is_invoked() {
        let form = FormSource::provider(|| "<generated/>".to_string())
            .resolve(&RejectingFetcher)
            .await
            .unwrap();
        assert_eq!(form.as_str(), "<generated/>");
    }

    #[tokio::test]
    async fn pending_is_awaited() {
        let form = FormSource::pending(async { "<later/>".to_string() })
            .resolve(&RejectingFetcher)
            .await
            .unwrap();
        assert_eq!(form.as_str(), "<later/>");
    }

    #[tokio::test]
    async fn remote_failure_surfaces_acquisition_error() {
        let err = FormSource::remote("http://forms.test/xform")
            .resolve(&RejectingFetcher)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Acquisition(_)));
    }
}
