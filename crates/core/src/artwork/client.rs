//! Metadata service abstraction used by the cover-art resolver.

use serde::Deserialize;

/// Errors from the metadata service.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing client credentials")]
    MissingCredentials,

    #[error("token response did not contain an access token")]
    MissingToken,
}

/// Bearer token obtained from the credential endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Result of a title search; at most one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResponse {
    pub candidate: Option<Candidate>,
}

/// Best search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Candidate {
    pub image_id: Option<String>,
}

impl SearchResponse {
    /// Image id of the candidate, if present and non-empty.
    pub fn image_id(&self) -> Option<&str> {
        self.candidate
            .as_ref()?
            .image_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Access to an external game metadata service.
///
/// Implementations are blocking; the export pass calls them one item at a
/// time.
pub trait MetadataClient {
    /// Acquire a bearer token. Called once per export run.
    fn fetch_token(&self) -> Result<AccessToken, MetadataError>;

    /// Search for `query` and return the best candidate.
    fn search(&self, token: &AccessToken, query: &str) -> Result<SearchResponse, MetadataError>;
}

impl<T: MetadataClient + ?Sized> MetadataClient for Box<T> {
    fn fetch_token(&self) -> Result<AccessToken, MetadataError> {
        (**self).fetch_token()
    }

    fn search(&self, token: &AccessToken, query: &str) -> Result<SearchResponse, MetadataError> {
        (**self).search(token, query)
    }
}

/// Outcome of the metadata step of the fallback chain for one item.
#[derive(Debug)]
pub enum LookupOutcome {
    /// The service returned an image; carries the canonical artwork URL.
    Found(String),
    /// No candidate, or a candidate without an image.
    NoMatch,
    /// The lookup itself failed; the item falls through to the next step.
    Failed(MetadataError),
    /// No credential for this run, so the service was not queried.
    Skipped,
}
