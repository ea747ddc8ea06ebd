pub mod sotwe;

use crate::error::Result;
use crate::sotwe_message::Identity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    pub title: String,
    pub description: String,
    pub link: String,
    pub image: Option<String>,
    pub items: Vec<FeedItem>,
    /// Zero items is a valid feed, not an error.
    pub allow_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub title: String,
    /// HTML fragment.
    pub description: String,
    pub link: String,
    pub pub_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, user: &Identity) -> Result<Feed>;
}
