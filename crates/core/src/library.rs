//! Host library access.

use std::{
    collections::HashMap,
    fs,
    path::Path,
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::SourceGame;

/// Read-only view of the library being exported.
pub trait GameLibrary {
    /// All games in library order.
    fn games(&self) -> Result<Vec<SourceGame>>;

    /// Display name of a platform, `None` when the id is unknown.
    fn platform_name(&self, id: &str) -> Result<Option<String>>;

    /// Display name of a library source, `None` when the id is unknown.
    fn source_name(&self, id: &str) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct NamedEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct LibraryDump {
    #[serde(default)]
    games: Vec<SourceGame>,
    #[serde(default)]
    platforms: Vec<NamedEntry>,
    #[serde(default)]
    sources: Vec<NamedEntry>,
}

/// Library backed by a JSON dump of the host database.
///
/// The dump is `{ "games": [...], "platforms": [...], "sources": [...] }`
/// where platforms and sources are `{ "id", "name" }` pairs.
#[derive(Debug, Clone, Default)]
pub struct JsonLibrary {
    games: Vec<SourceGame>,
    platforms: HashMap<String, String>,
    sources: HashMap<String, String>,
}

impl JsonLibrary {
    /// Read and index a dump from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read library {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("failed to parse library {}", path.display()))
    }

    /// Parse a dump from a string.
    pub fn from_json(content: &str) -> Result<Self> {
        let dump: LibraryDump = serde_json::from_str(content)?;
        Ok(Self {
            games: dump.games,
            platforms: index(dump.platforms),
            sources: index(dump.sources),
        })
    }

    /// Build a library in memory.
    pub fn new(
        games: Vec<SourceGame>,
        platforms: impl IntoIterator<Item = (String, String)>,
        sources: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            games,
            platforms: platforms.into_iter().collect(),
            sources: sources.into_iter().collect(),
        }
    }
}

fn index(entries: Vec<NamedEntry>) -> HashMap<String, String> {
    entries
        .into_iter()
        .map(|entry| (entry.id, entry.name))
        .collect()
}

impl GameLibrary for JsonLibrary {
    fn games(&self) -> Result<Vec<SourceGame>> {
        Ok(self.games.clone())
    }

    fn platform_name(&self, id: &str) -> Result<Option<String>> {
        Ok(self.platforms.get(id).cloned())
    }

    fn source_name(&self, id: &str) -> Result<Option<String>> {
        Ok(self.sources.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_dump_with_partial_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("library.json");
        fs::write(
            &path,
            r#"{
  "games": [
    {
      "id": "g1",
      "name": "Portal 2",
      "platformIds": ["pc"],
      "sourceId": "steam",
      "pluginId": "cb91dfc9-b977-43bf-8e70-55f46e410fab",
      "gameId": "620",
      "playtime": 3600,
      "releaseDate": "2011-04-19",
      "genres": ["Puzzle", "Platform"],
      "links": [{"name": "Community Hub", "url": "https://steamcommunity.com/app/620"}]
    },
    { "id": "g2", "name": "Bare", "genres": null }
  ],
  "platforms": [{"id": "pc", "name": "PC (Windows)"}],
  "sources": [{"id": "steam", "name": "Steam"}]
}"#,
        )?;

        let library = JsonLibrary::open(&path)?;
        let games = library.games()?;
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].game_id.as_deref(), Some("620"));
        assert_eq!(games[0].playtime, Some(3600));
        assert!(games[1].genres.is_none());
        assert!(games[1].platform_ids.is_none());

        assert_eq!(library.platform_name("pc")?.as_deref(), Some("PC (Windows)"));
        assert_eq!(library.platform_name("ps5")?, None);
        assert_eq!(library.source_name("steam")?.as_deref(), Some("Steam"));
        Ok(())
    }

    #[test]
    fn missing_dump_is_an_error() {
        let dir = tempdir().unwrap();
        let err = JsonLibrary::open(dir.path().join("absent.json")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read library"));
    }
}
