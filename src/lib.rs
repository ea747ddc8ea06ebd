//! Sotwe user timelines as feeds.
//!
//! Requests go through a FlareSolverr instance, the JSON the browser renders
//! is pulled out of its `<pre>` wrapper, and each post (with any quoted,
//! retweeted or conversation posts) is rendered to an HTML description.

pub mod cache;
pub mod config;
pub mod error;
pub mod feeds;
pub mod render;
pub mod solver;
pub mod sotwe_message;
pub mod sotwe_parser;

pub use config::AppConfig;
pub use error::{BypassError, FeedError};
pub use feeds::sotwe::SotweFetcher;
pub use feeds::{Feed, FeedFetcher, FeedItem};
pub use sotwe_message::Identity;
