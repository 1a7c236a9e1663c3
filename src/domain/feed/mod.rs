pub mod model;

pub use model::{Feed, FeedItem, NewFeedItem, SystemSettings};
