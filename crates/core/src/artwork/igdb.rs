//! Blocking IGDB client.
//!
//! Tokens come from the Twitch client-credentials endpoint; searches go to
//! the IGDB `games` endpoint with an Apicalypse query body.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::debug;

use super::client::{AccessToken, Candidate, MetadataClient, MetadataError, SearchResponse};
use crate::config::MetadataConfig;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IgdbGame {
    #[serde(default)]
    cover: Option<Candidate>,
}

/// IGDB metadata client.
pub struct IgdbClient {
    http: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    search_url: String,
}

impl IgdbClient {
    /// Build a client from configuration.
    ///
    /// Fails with [`MetadataError::MissingCredentials`] when no client id or
    /// secret is configured.
    pub fn from_config(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client_id = config
            .client_id
            .clone()
            .filter(|value| !value.trim().is_empty())
            .ok_or(MetadataError::MissingCredentials)?;
        let client_secret = config
            .client_secret
            .clone()
            .filter(|value| !value.trim().is_empty())
            .ok_or(MetadataError::MissingCredentials)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            client_id,
            client_secret,
            token_url: config.token_url.clone(),
            search_url: config.search_url.clone(),
        })
    }

    fn check(resp: Response) -> Result<Response, MetadataError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(MetadataError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

impl MetadataClient for IgdbClient {
    fn fetch_token(&self) -> Result<AccessToken, MetadataError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];
        let resp = self.http.post(&self.token_url).form(&params).send()?;
        let body = Self::check(resp)?.text()?;
        let token: TokenResponse = serde_json::from_str(&body)?;

        token
            .access_token
            .filter(|value| !value.is_empty())
            .map(AccessToken::new)
            .ok_or(MetadataError::MissingToken)
    }

    fn search(&self, token: &AccessToken, query: &str) -> Result<SearchResponse, MetadataError> {
        let body = search_body(query);
        debug!(%query, "searching metadata service");

        let resp = self
            .http
            .post(&self.search_url)
            .header("Client-ID", &self.client_id)
            .header(AUTHORIZATION, format!("Bearer {}", token.as_str()))
            .header(ACCEPT, "application/json")
            .body(body)
            .send()?;
        let body = Self::check(resp)?.text()?;
        let games: Vec<IgdbGame> = serde_json::from_str(&body)?;

        Ok(SearchResponse {
            candidate: games.into_iter().next().and_then(|game| game.cover),
        })
    }
}

/// Apicalypse query for the first match of `title` with its cover image.
fn search_body(title: &str) -> String {
    let escaped = title.replace('\\', "\\\\").replace('"', "\\\"");
    format!("search \"{escaped}\"; fields cover.image_id; limit 1;")
}
