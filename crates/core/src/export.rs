//! One incremental export pass.

use std::fmt;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    artwork::{CoverArtResolver, RunContext},
    catalog::{BuildOutcome, CatalogBuilder, Progress},
    library::GameLibrary,
    merge,
    snapshot::SnapshotStore,
};

/// Terminal status of a run, reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    /// The pass finished; `written` is false when nothing changed.
    #[allow(missing_docs)]
    Completed { count: usize, written: bool },
    /// Cancellation was requested; the snapshot file was not touched.
    #[allow(missing_docs)]
    Cancelled { processed: usize },
    /// A fatal error aborted the pass.
    Failed(String),
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStatus::Completed {
                count,
                written: true,
            } => write!(f, "Export complete! {count} games saved"),
            ExportStatus::Completed {
                count,
                written: false,
            } => write!(
                f,
                "No changes detected, existing export of {count} games is up to date"
            ),
            ExportStatus::Cancelled { processed } => {
                write!(f, "Export cancelled after {processed} games")
            }
            ExportStatus::Failed(message) => write!(f, "An error occurred: {message}"),
        }
    }
}

/// Drives library enumeration, record building, merging and persistence.
pub struct ExportPass {
    store: SnapshotStore,
    resolver: CoverArtResolver,
}

impl ExportPass {
    /// Create a pass writing to `store`.
    pub fn new(store: SnapshotStore, resolver: CoverArtResolver) -> Self {
        Self { store, resolver }
    }

    /// Snapshot store used by this pass.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Run a full pass. `ctx` is consumed so its credential ends with the run.
    pub fn run(
        &self,
        library: &dyn GameLibrary,
        ctx: RunContext,
        cancel: &CancellationToken,
        progress: impl FnMut(Progress),
    ) -> ExportStatus {
        info!("Export file path: {}", self.store.path().display());
        match self.try_run(library, &ctx, cancel, progress) {
            Ok(status) => status,
            Err(err) => {
                error!("Failed to export games: {err:#}");
                ExportStatus::Failed(format!("{err:#}"))
            }
        }
    }

    fn try_run(
        &self,
        library: &dyn GameLibrary,
        ctx: &RunContext,
        cancel: &CancellationToken,
        progress: impl FnMut(Progress),
    ) -> Result<ExportStatus> {
        let previous = self.store.load();
        let items = library.games().context("failed to enumerate library")?;
        info!("Exporting {} games", items.len());

        let builder = CatalogBuilder::new(library, &self.resolver, ctx);
        let records = match builder.build(&items, cancel, progress) {
            BuildOutcome::Complete(records) => records,
            BuildOutcome::Cancelled { processed } => {
                info!("Export cancelled after {processed} of {} games", items.len());
                return Ok(ExportStatus::Cancelled { processed });
            }
        };

        let result = merge::merge(records, &previous);
        let count = result.snapshot.len();
        if !result.changed {
            info!("No changes detected, skipping save.");
            return Ok(ExportStatus::Completed {
                count,
                written: false,
            });
        }

        self.store
            .save(&result.snapshot)
            .context("failed to save snapshot")?;
        info!(
            added = result.stats.added,
            updated = result.stats.updated,
            unchanged = result.stats.unchanged,
            removed = result.stats.removed,
            "Export complete! {count} games saved to {}",
            self.store.path().display()
        );
        Ok(ExportStatus::Completed {
            count,
            written: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        artwork::{AccessToken, Candidate, MetadataClient, MetadataError, SearchResponse},
        library::JsonLibrary,
        models::SourceGame,
    };
    use anyhow::anyhow;
    use std::{
        cell::Cell,
        fs,
        rc::Rc,
    };
    use tempfile::tempdir;

    struct CoverClient {
        token_calls: Rc<Cell<usize>>,
    }

    impl MetadataClient for CoverClient {
        fn fetch_token(&self) -> Result<AccessToken, MetadataError> {
            self.token_calls.set(self.token_calls.get() + 1);
            Ok(AccessToken::new("token"))
        }

        fn search(
            &self,
            _token: &AccessToken,
            query: &str,
        ) -> Result<SearchResponse, MetadataError> {
            Ok(SearchResponse {
                candidate: Some(Candidate {
                    image_id: Some(query.to_lowercase().replace(' ', "_")),
                }),
            })
        }
    }

    struct FailingLibrary;

    impl GameLibrary for FailingLibrary {
        fn games(&self) -> Result<Vec<SourceGame>> {
            Err(anyhow!("library unavailable"))
        }

        fn platform_name(&self, _id: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn source_name(&self, _id: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn games() -> Vec<SourceGame> {
        let mut hades = SourceGame::new("1", "Hades");
        hades.playtime = Some(100);
        hades.platform_ids = Some(vec!["pc".to_string()]);
        let mut celeste = SourceGame::new("2", "Celeste");
        celeste.genres = Some(vec!["Platform".to_string()]);
        let mut portal = SourceGame::new("3", "Portal 2");
        portal.plugin_id = Some("cb91dfc9-b977-43bf-8e70-55f46e410fab".to_string());
        portal.game_id = Some("620".to_string());
        vec![hades, celeste, portal]
    }

    fn library(games: Vec<SourceGame>) -> JsonLibrary {
        JsonLibrary::new(
            games,
            [("pc".to_string(), "PC (Windows)".to_string())],
            Vec::new(),
        )
    }

    fn online(token_calls: &Rc<Cell<usize>>) -> RunContext {
        RunContext::begin(Box::new(CoverClient {
            token_calls: Rc::clone(token_calls),
        }))
    }

    fn export_pass(dir: &std::path::Path) -> ExportPass {
        ExportPass::new(
            SnapshotStore::new(dir.join("games_export.json")),
            CoverArtResolver::default(),
        )
    }

    #[test]
    fn second_identical_run_performs_no_write() -> Result<()> {
        let dir = tempdir()?;
        let pass = export_pass(dir.path());
        let library = library(games());
        let calls = Rc::new(Cell::new(0));

        let status = pass.run(&library, online(&calls), &CancellationToken::new(), |_| {});
        assert_eq!(
            status,
            ExportStatus::Completed {
                count: 3,
                written: true
            }
        );
        let first = fs::read(pass.store().path())?;
        let first_modified = fs::metadata(pass.store().path())?.modified()?;

        let status = pass.run(&library, online(&calls), &CancellationToken::new(), |_| {});
        assert_eq!(
            status,
            ExportStatus::Completed {
                count: 3,
                written: false
            }
        );
        assert_eq!(fs::read(pass.store().path())?, first);
        assert_eq!(fs::metadata(pass.store().path())?.modified()?, first_modified);
        // One token per run, never carried over.
        assert_eq!(calls.get(), 2);
        Ok(())
    }

    #[test]
    fn rich_records_are_stable_across_runs() -> Result<()> {
        use chrono::{Duration, NaiveDate, TimeZone, Utc};

        let dir = tempdir()?;
        let pass = export_pass(dir.path());
        let played = Utc.with_ymd_and_hms(2024, 3, 9, 21, 15, 2).unwrap()
            + Duration::nanoseconds(123_456_789);

        let mut rich = games();
        for (i, game) in rich.iter_mut().enumerate() {
            let offset = i as f64;
            game.community_score = Some(54.781751339831196 + offset / 3.0);
            game.user_score = Some(f64::from(7.3_f32) + offset * 0.1);
            game.last_activity = Some(played + Duration::microseconds(i as i64 * 7));
            game.added = Some(played - Duration::milliseconds(987));
            game.release_date = NaiveDate::from_ymd_opt(2018, 12, 6);
        }
        let library = library(rich);

        let status = pass.run(&library, RunContext::offline("test"), &CancellationToken::new(), |_| {});
        assert!(matches!(status, ExportStatus::Completed { written: true, .. }));
        let first = fs::read(pass.store().path())?;

        let status = pass.run(&library, RunContext::offline("test"), &CancellationToken::new(), |_| {});
        assert_eq!(
            status,
            ExportStatus::Completed {
                count: 3,
                written: false
            }
        );
        assert_eq!(fs::read(pass.store().path())?, first);
        Ok(())
    }

    #[test]
    fn single_change_rewrites_only_that_record() -> Result<()> {
        let dir = tempdir()?;
        let pass = export_pass(dir.path());
        let calls = Rc::new(Cell::new(0));

        pass.run(&library(games()), online(&calls), &CancellationToken::new(), |_| {});
        let before: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(pass.store().path())?)?;

        let mut changed = games();
        changed[0].playtime = Some(250);
        let status = pass.run(&library(changed), online(&calls), &CancellationToken::new(), |_| {});
        assert!(matches!(status, ExportStatus::Completed { written: true, .. }));

        let after: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(pass.store().path())?)?;
        assert_eq!(after[0]["playtimeSeconds"], serde_json::json!(250));
        assert_eq!(after[1], before[1]);
        assert_eq!(after[2], before[2]);
        Ok(())
    }

    #[test]
    fn removed_game_is_dropped() -> Result<()> {
        let dir = tempdir()?;
        let pass = export_pass(dir.path());

        pass.run(
            &library(games()),
            RunContext::offline("test"),
            &CancellationToken::new(),
            |_| {},
        );
        let mut fewer = games();
        fewer.remove(1);
        let status = pass.run(
            &library(fewer),
            RunContext::offline("test"),
            &CancellationToken::new(),
            |_| {},
        );
        assert_eq!(
            status,
            ExportStatus::Completed {
                count: 2,
                written: true
            }
        );
        assert!(pass.store().load().iter().all(|record| record.id != "2"));
        Ok(())
    }

    #[test]
    fn covers_follow_the_fallback_chain() -> Result<()> {
        let dir = tempdir()?;
        let pass = export_pass(dir.path());

        pass.run(
            &library(games()),
            RunContext::offline("test"),
            &CancellationToken::new(),
            |_| {},
        );
        let records = pass.store().load();
        assert_eq!(records[0].cover_art_url, "https://placehold.co/60x60.svg");
        assert_eq!(
            records[2].cover_art_url,
            "https://shared.cloudflare.steamstatic.com/store_item_assets/steam/apps/620/library_600x900.jpg"
        );
        assert_eq!(records[2].store_id.as_deref(), Some("620"));

        let calls = Rc::new(Cell::new(0));
        pass.run(&library(games()), online(&calls), &CancellationToken::new(), |_| {});
        let records = pass.store().load();
        assert_eq!(
            records[2].cover_art_url,
            "https://images.igdb.com/igdb/image/upload/t_cover_big/portal_2.jpg"
        );
        Ok(())
    }

    #[test]
    fn cancellation_leaves_snapshot_untouched() -> Result<()> {
        let dir = tempdir()?;
        let pass = export_pass(dir.path());
        pass.run(
            &library(games()),
            RunContext::offline("test"),
            &CancellationToken::new(),
            |_| {},
        );
        let before = fs::read(pass.store().path())?;

        let mut changed = games();
        changed[2].playtime = Some(5);
        let cancel = CancellationToken::new();
        let status = pass.run(&library(changed), RunContext::offline("test"), &cancel, |p| {
            if p.processed == 1 {
                cancel.cancel();
            }
        });
        assert_eq!(status, ExportStatus::Cancelled { processed: 1 });
        assert_eq!(fs::read(pass.store().path())?, before);
        Ok(())
    }

    #[test]
    fn corrupted_snapshot_is_rewritten() -> Result<()> {
        let dir = tempdir()?;
        let pass = export_pass(dir.path());
        fs::write(pass.store().path(), "{ definitely not json")?;

        let status = pass.run(
            &library(games()),
            RunContext::offline("test"),
            &CancellationToken::new(),
            |_| {},
        );
        assert_eq!(
            status,
            ExportStatus::Completed {
                count: 3,
                written: true
            }
        );
        assert_eq!(pass.store().load().len(), 3);
        Ok(())
    }

    #[test]
    fn library_failure_is_reported() {
        let dir = tempdir().unwrap();
        let pass = export_pass(dir.path());

        let status = pass.run(
            &FailingLibrary,
            RunContext::offline("test"),
            &CancellationToken::new(),
            |_| {},
        );
        match status {
            ExportStatus::Failed(message) => assert!(message.contains("library unavailable")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!pass.store().path().exists());
    }

    #[test]
    fn unwritable_destination_fails_without_partial_file() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "")?;
        let pass = ExportPass::new(
            SnapshotStore::new(blocker.join("games_export.json")),
            CoverArtResolver::default(),
        );

        let status = pass.run(
            &library(games()),
            RunContext::offline("test"),
            &CancellationToken::new(),
            |_| {},
        );
        assert!(matches!(status, ExportStatus::Failed(_)));
        assert_eq!(fs::read_to_string(&blocker)?, "");
        Ok(())
    }

    #[test]
    fn status_messages() {
        assert_eq!(
            ExportStatus::Completed {
                count: 4,
                written: true
            }
            .to_string(),
            "Export complete! 4 games saved"
        );
        assert_eq!(
            ExportStatus::Cancelled { processed: 2 }.to_string(),
            "Export cancelled after 2 games"
        );
    }
}
