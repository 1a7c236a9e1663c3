pub mod feed_repository;
pub mod feed_store;

pub use feed_repository::FeedRepository;
pub use feed_store::{shared, FeedStore, SharedFeedStore};
