//! Attachment download

mod fetcher;

pub use fetcher::HttpMediaFetcher;
