//! Cover-art fallback chain.

use tracing::{debug, info, warn};

use super::client::{AccessToken, LookupOutcome, MetadataClient};
use crate::normalize::normalize;

/// Canonical IGDB cover template; `{image_id}` is substituted.
pub const METADATA_COVER_TEMPLATE: &str =
    "https://images.igdb.com/igdb/image/upload/t_cover_big/{image_id}.jpg";

/// Placeholder returned when every other step misses.
pub const DEFAULT_PLACEHOLDER_URL: &str = "https://placehold.co/60x60.svg";

/// A storefront whose artwork can be addressed from its native id alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Storefront {
    /// Display name used in logs.
    pub name: &'static str,
    /// Identifier of the library plugin that imports this storefront.
    pub plugin_id: &'static str,
    /// Artwork URL template; `{id}` is substituted.
    pub cover_template: &'static str,
}

/// Storefronts recognized by plugin id.
pub const KNOWN_STOREFRONTS: &[Storefront] = &[Storefront {
    name: "Steam",
    plugin_id: "cb91dfc9-b977-43bf-8e70-55f46e410fab",
    cover_template:
        "https://shared.cloudflare.steamstatic.com/store_item_assets/steam/apps/{id}/library_600x900.jpg",
}];

impl Storefront {
    /// Look up a storefront by the originating plugin id (case-insensitive).
    pub fn from_plugin_id(plugin_id: &str) -> Option<&'static Storefront> {
        let plugin_id = plugin_id.trim();
        KNOWN_STOREFRONTS
            .iter()
            .find(|store| store.plugin_id.eq_ignore_ascii_case(plugin_id))
    }

    /// Storefront-hosted artwork for `native_id`.
    pub fn cover_url(&self, native_id: &str) -> String {
        self.cover_template.replace("{id}", native_id)
    }
}

/// Storefront and native id of an item, when it came from a known provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorefrontHint<'a> {
    pub storefront: &'static Storefront,
    pub native_id: &'a str,
}

/// Which step of the chain produced a cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverSource {
    Metadata,
    Storefront,
    Placeholder,
}

/// A resolved artwork URL and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCover {
    pub url: String,
    pub source: CoverSource,
}

/// Credential state for one export run.
#[derive(Debug)]
pub enum Credential {
    Ready(AccessToken),
    Unavailable(String),
}

/// Run-scoped state: the metadata client and the token fetched for this run.
///
/// Created at the start of an export pass and dropped at its end, so a
/// token never outlives the run that acquired it.
pub struct RunContext {
    client: Option<Box<dyn MetadataClient>>,
    credential: Credential,
}

impl RunContext {
    /// Fetch a token once for the coming run.
    ///
    /// A failed fetch is logged here and disables metadata lookups for the
    /// whole run.
    pub fn begin(client: Box<dyn MetadataClient>) -> Self {
        let credential = match client.fetch_token() {
            Ok(token) => {
                info!("metadata service token acquired");
                Credential::Ready(token)
            }
            Err(err) => {
                warn!("metadata token unavailable, using fallback artwork for this run: {err}");
                Credential::Unavailable(err.to_string())
            }
        };
        Self {
            client: Some(client),
            credential,
        }
    }

    /// Context with no metadata service at all.
    pub fn offline(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        info!("metadata lookups disabled: {reason}");
        Self {
            client: None,
            credential: Credential::Unavailable(reason),
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Whether step 1 of the chain is active for this run.
    pub fn lookups_enabled(&self) -> bool {
        self.client.is_some() && matches!(self.credential, Credential::Ready(_))
    }

    fn lookup(&self, query: &str) -> LookupOutcome {
        let (Some(client), Credential::Ready(token)) = (&self.client, &self.credential) else {
            return LookupOutcome::Skipped;
        };

        match client.search(token, query) {
            Ok(response) => match response.image_id() {
                Some(image_id) => {
                    LookupOutcome::Found(METADATA_COVER_TEMPLATE.replace("{image_id}", image_id))
                }
                None => LookupOutcome::NoMatch,
            },
            Err(err) => LookupOutcome::Failed(err),
        }
    }
}

/// Resolves the best available cover for a title.
pub struct CoverArtResolver {
    placeholder_url: String,
}

impl Default for CoverArtResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_URL)
    }
}

impl CoverArtResolver {
    pub fn new(placeholder_url: impl Into<String>) -> Self {
        Self {
            placeholder_url: placeholder_url.into(),
        }
    }

    /// Walk the chain: metadata search, storefront template, placeholder.
    pub fn resolve(
        &self,
        ctx: &RunContext,
        title: &str,
        hint: Option<StorefrontHint<'_>>,
    ) -> ResolvedCover {
        let query = normalize(title);
        match ctx.lookup(&query) {
            LookupOutcome::Found(url) => {
                return ResolvedCover {
                    url,
                    source: CoverSource::Metadata,
                }
            }
            LookupOutcome::NoMatch => debug!(%query, "no metadata cover"),
            LookupOutcome::Failed(err) => warn!("failed to fetch cover for {title}: {err}"),
            LookupOutcome::Skipped => {}
        }

        if let Some(hint) = hint.filter(|hint| !hint.native_id.trim().is_empty()) {
            return ResolvedCover {
                url: hint.storefront.cover_url(hint.native_id.trim()),
                source: CoverSource::Storefront,
            };
        }

        ResolvedCover {
            url: self.placeholder_url.clone(),
            source: CoverSource::Placeholder,
        }
    }
}
