//! Shared domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Label used when a platform or source cannot be resolved.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// One exported catalog entry as persisted in the snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Stable identifier of the library item; primary key for merging.
    pub id: String,
    /// Display title, copied verbatim from the library.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Resolved platform label or [`UNKNOWN_LABEL`].
    pub platform_name: String,
    /// Resolved library source label or [`UNKNOWN_LABEL`].
    pub source_name: String,
    /// Total playtime in seconds.
    #[serde(default)]
    pub playtime_seconds: Option<u64>,
    /// Last time the game was played.
    #[serde(default)]
    pub last_played_at: Option<DateTime<Utc>>,
    /// Time the game was added to the library.
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    /// Release date without a time component.
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Genre names in library order.
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    /// First link whose label mentions "Community".
    #[serde(default)]
    pub community_hub_url: Option<String>,
    /// Native storefront identifier for recognized providers.
    #[serde(default)]
    pub store_id: Option<String>,
    /// Best available artwork URL.
    pub cover_art_url: String,
    /// Community rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community_score: Option<f64>,
    /// Critic rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critic_score: Option<u32>,
    /// Personal rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_score: Option<f64>,
}

/// A named link attached to a library item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    /// Link label as shown by the host library.
    pub name: String,
    /// Link target.
    pub url: String,
}

/// A game as enumerated from the host library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceGame {
    /// Library-wide unique identifier.
    pub id: String,
    /// Display title.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Platform references, resolved through the library.
    #[serde(default)]
    pub platform_ids: Option<Vec<String>>,
    /// Library source reference, resolved through the library.
    #[serde(default)]
    pub source_id: Option<String>,
    /// Identifier of the plugin that imported this game.
    #[serde(default)]
    pub plugin_id: Option<String>,
    /// Plugin-native identifier (e.g. a Steam app id).
    #[serde(default)]
    pub game_id: Option<String>,
    /// Playtime in seconds.
    #[serde(default)]
    pub playtime: Option<u64>,
    /// Last time the game was played.
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    /// Time the game was added to the library.
    #[serde(default)]
    pub added: Option<DateTime<Utc>>,
    /// Release date.
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Genre names in library order.
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    /// Named links such as store or community pages.
    #[serde(default)]
    pub links: Option<Vec<SourceLink>>,
    /// Community rating.
    #[serde(default)]
    pub community_score: Option<f64>,
    /// Critic rating.
    #[serde(default)]
    pub critic_score: Option<u32>,
    /// Personal rating.
    #[serde(default)]
    pub user_score: Option<f64>,
}

impl SourceGame {
    /// Convenience constructor used by library backends and tests.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// URL of the first link whose label contains "Community".
    pub fn community_hub_url(&self) -> Option<String> {
        self.links
            .as_ref()?
            .iter()
            .find(|link| link.name.contains("Community"))
            .map(|link| link.url.clone())
    }
}
