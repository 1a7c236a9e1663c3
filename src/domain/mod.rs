pub mod feed;
pub mod ingest;
