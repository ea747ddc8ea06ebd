use super::{Feed, FeedFetcher, FeedItem};
use crate::cache::{user_cache_key, FeedCache};
use crate::config::{AppConfig, SiteConfig};
use crate::error::{BypassError, FeedError, Result};
use crate::render::{render_description, render_title};
use crate::solver::SolverClient;
use crate::sotwe_message::{CreatedAt, Identity, Payload, RawPost};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// `created_at` layout of the v1.1 Twitter API, e.g. `Wed Oct 10 20:19:24 +0000 2018`.
const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

pub struct SotweFetcher {
    solver: SolverClient,
    cache: FeedCache<Arc<Payload>>,
    ttl: Duration,
    site: SiteConfig,
}

impl SotweFetcher {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            solver: SolverClient::new(&config.solver),
            cache: FeedCache::new(config.cache.max_capacity),
            ttl: config.cache.route_expire(),
            site: config.site.clone(),
        }
    }

    pub fn api_url(&self, user: &Identity) -> String {
        format!(
            "{}/api/v3/user/{}/",
            self.site.base_url.trim_end_matches('/'),
            urlencoding::encode(user.as_str())
        )
    }

    pub fn is_cached(&self, user: &Identity) -> bool {
        self.cache.contains(&user_cache_key(user.as_str()))
    }

    /// Cached payload for `user`; at most one solver request per user is in
    /// flight at a time.
    async fn load_payload(&self, user: &Identity) -> Result<Arc<Payload>> {
        let api_url = self.api_url(user);
        let payload = self
            .cache
            .try_get(&user_cache_key(user.as_str()), self.ttl, async {
                let solution = self.solver.get(&api_url).await?;
                let body = solution.response.unwrap_or_default();
                Ok::<_, BypassError>(Arc::new(Payload::from_html(&body)))
            })
            .await?;
        Ok(payload)
    }
}

#[async_trait]
impl FeedFetcher for SotweFetcher {
    async fn fetch(&self, user: &Identity) -> Result<Feed> {
        let payload = self.load_payload(user).await?;
        let feed = build_feed(user, &payload, &self.site)?;
        debug!(user = %user, items = feed.items.len(), "built feed");
        Ok(feed)
    }
}

/// Project a payload onto a feed. A payload without `info` is an error; one
/// without `data` produces an empty feed.
pub fn build_feed(user: &Identity, payload: &Payload, site: &SiteConfig) -> Result<Feed> {
    let Payload::Parsed(parsed) = payload else {
        return Err(FeedError::MissingMetadata);
    };
    let info = parsed.info.as_ref().ok_or(FeedError::MissingMetadata)?;

    let items = parsed
        .data
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|post| build_item(user, post, site))
        .collect();

    Ok(Feed {
        title: format!("Twitter - {} @{}", info.name, info.screen_name),
        description: info.description.clone(),
        link: format!("{}/{}", site.base_url.trim_end_matches('/'), user),
        image: info.profile_image_thumbnail.clone(),
        items,
        allow_empty: true,
    })
}

fn build_item(user: &Identity, post: &RawPost, site: &SiteConfig) -> FeedItem {
    let pub_date = post.created_at.as_ref().and_then(|created_at| {
        let parsed = parse_created_at(created_at);
        if parsed.is_none() {
            warn!(post = %post.id, value = ?created_at, "unparseable createdAt");
        }
        parsed
    });

    FeedItem {
        title: render_title(post),
        description: render_description(post),
        link: format!(
            "{}/{}/status/{}",
            site.permalink_base.trim_end_matches('/'),
            user,
            post.id
        ),
        pub_date,
    }
}

/// Sotwe reports epoch milliseconds; older records carry RFC 3339 or the
/// classic Twitter timestamp.
pub fn parse_created_at(created_at: &CreatedAt) -> Option<DateTime<Utc>> {
    match created_at {
        CreatedAt::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
        CreatedAt::Fractional(ms) if ms.is_finite() => {
            Utc.timestamp_millis_opt(ms.trunc() as i64).single()
        }
        CreatedAt::Fractional(_) => None,
        CreatedAt::Text(text) => {
            let text = text.trim();
            if let Ok(ms) = text.parse::<i64>() {
                return Utc.timestamp_millis_opt(ms).single();
            }
            DateTime::parse_from_rfc3339(text)
                .or_else(|_| DateTime::parse_from_str(text, TWITTER_DATE_FORMAT))
                .or_else(|_| DateTime::parse_from_rfc2822(text))
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}
