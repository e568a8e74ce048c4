#![allow(missing_docs)]

//! Cover-art resolution.

/// Metadata service abstraction and lookup outcomes.
pub mod client;
/// Blocking IGDB implementation of [`client::MetadataClient`].
pub mod igdb;
/// Fallback chain and run-scoped credential context.
pub mod resolver;

pub use client::{AccessToken, Candidate, LookupOutcome, MetadataClient, MetadataError, SearchResponse};
pub use igdb::IgdbClient;
pub use resolver::{
    CoverArtResolver, CoverSource, Credential, ResolvedCover, RunContext, Storefront,
    StorefrontHint, DEFAULT_PLACEHOLDER_URL, KNOWN_STOREFRONTS,
};
