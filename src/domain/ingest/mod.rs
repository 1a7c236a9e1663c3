//! Fetch, parse, diff and import of subscribed feeds.

pub mod error;
pub mod hasher;
pub mod identity;
pub mod import;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod scheduler;


pub use error::{ErrorContext, IngestError};
pub use hasher::{ContentHasher, XxHasher};
pub use identity::{Identity, IdentityField, IdentityResolver};
pub use import::ImportService;
pub use model::{FeedUpdateModel, ImportSummary, ParsedFeed, ParsedFeedItem, RawFeedItem};
pub use orchestrator::{CycleReport, FeedOutcome, FeedStage, IngestOrchestrator};
pub use parser::FeedParser;
pub use scheduler::{CycleScheduler, FetcherFactory, HttpFetcherFactory};
