#![allow(missing_docs)]

//! Builds normalized catalog records from library items.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    artwork::{CoverArtResolver, RunContext, Storefront, StorefrontHint},
    library::GameLibrary,
    models::{GameRecord, SourceGame, UNKNOWN_LABEL},
};

/// Items processed so far out of the whole pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

/// Result of a build pass.
#[derive(Debug)]
pub enum BuildOutcome {
    /// Every item was processed, in source order.
    Complete(Vec<GameRecord>),
    /// Cancellation was observed before item `processed + 1`.
    Cancelled { processed: usize },
}

/// Turns [`SourceGame`]s into [`GameRecord`]s for one run.
pub struct CatalogBuilder<'a> {
    library: &'a dyn GameLibrary,
    resolver: &'a CoverArtResolver,
    ctx: &'a RunContext,
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(
        library: &'a dyn GameLibrary,
        resolver: &'a CoverArtResolver,
        ctx: &'a RunContext,
    ) -> Self {
        Self {
            library,
            resolver,
            ctx,
        }
    }

    /// Process `items` one at a time, polling `cancel` before each.
    pub fn build(
        &self,
        items: &[SourceGame],
        cancel: &CancellationToken,
        mut progress: impl FnMut(Progress),
    ) -> BuildOutcome {
        let total = items.len();
        let mut records = Vec::with_capacity(total);

        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                return BuildOutcome::Cancelled { processed: index };
            }
            records.push(self.build_record(item));
            progress(Progress {
                processed: index + 1,
                total,
            });
        }

        BuildOutcome::Complete(records)
    }

    /// Derive the record for a single item.
    pub fn build_record(&self, item: &SourceGame) -> GameRecord {
        let platform_name = item
            .platform_ids
            .as_ref()
            .and_then(|ids| ids.first())
            .and_then(|id| self.label(id, "platform", |id| self.library.platform_name(id)))
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        let source_name = item
            .source_id
            .as_deref()
            .and_then(|id| self.label(id, "source", |id| self.library.source_name(id)))
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());

        let storefront = item
            .plugin_id
            .as_deref()
            .and_then(Storefront::from_plugin_id);
        let store_id = storefront.and(
            item.game_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        );
        let hint = storefront.zip(store_id.as_deref()).map(|(storefront, native_id)| {
            StorefrontHint {
                storefront,
                native_id,
            }
        });

        let cover = self.resolver.resolve(self.ctx, &item.name, hint);
        debug!(game = %item.name, source = ?cover.source, "resolved cover");

        GameRecord {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            platform_name,
            source_name,
            playtime_seconds: item.playtime,
            last_played_at: item.last_activity,
            added_at: item.added,
            release_date: item.release_date,
            genres: item.genres.clone(),
            community_hub_url: item.community_hub_url(),
            store_id,
            cover_art_url: cover.url,
            community_score: item.community_score,
            critic_score: item.critic_score,
            user_score: item.user_score,
        }
    }

    fn label(
        &self,
        id: &str,
        kind: &str,
        lookup: impl Fn(&str) -> anyhow::Result<Option<String>>,
    ) -> Option<String> {
        match lookup(id) {
            Ok(name) => name.filter(|name| !name.trim().is_empty()),
            Err(err) => {
                warn!("{kind} lookup failed for {id}: {err:#}");
                None
            }
        }
    }
}
