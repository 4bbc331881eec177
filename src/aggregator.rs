use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::config::{ChannelConfig, Config};

// Several Israeli news origins reject non-browser user agents.
const USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148 Safari/604.1";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// One normalized news flash, denormalized with its channel's display data
/// so the client never needs a second lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String,
    pub source: String,
    pub source_name: String,
    pub source_color: String,
    pub source_icon: String,
    pub title: String,
    pub desc: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub time_ago: String,
    pub ts: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed parse failed: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),
}

struct NewsCache {
    items: Vec<NewsItem>,
    refreshed_at: DateTime<Utc>,
}

pub struct Aggregator {
    client: Client,
    channels: Vec<ChannelConfig>,
    description_limit: usize,
    channel_limit: usize,
    cache_ttl: chrono::Duration,
    cache: RwLock<NewsCache>,
    // Serializes refreshes so the cache has a single writer at a time.
    refresh_gate: Mutex<()>,
}

impl Aggregator {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            channels: config.channels.clone(),
            description_limit: config.description_limit,
            channel_limit: config.channel_limit,
            cache_ttl: chrono::Duration::seconds(config.cache_ttl_seconds as i64),
            cache: RwLock::new(NewsCache {
                items: Vec::new(),
                // Epoch-old cache: the first request always refreshes
                refreshed_at: DateTime::UNIX_EPOCH,
            }),
            refresh_gate: Mutex::new(()),
        }
    }

    pub async fn is_fresh(&self) -> bool {
        let cache = self.cache.read().await;
        Utc::now() - cache.refreshed_at < self.cache_ttl
    }

    pub async fn item_count(&self) -> usize {
        self.cache.read().await.items.len()
    }

    /// Returns the cached items and the instant they were aggregated,
    /// refreshing first when the cache has gone stale.
    pub async fn news(&self) -> (Vec<NewsItem>, DateTime<Utc>) {
        if !self.is_fresh().await {
            self.refresh().await;
        }

        let cache = self.cache.read().await;
        (cache.items.clone(), cache.refreshed_at)
    }

    /// Fetches every channel concurrently, merges the survivors into one
    /// timestamp-ordered list and swaps it into the cache wholesale.
    pub async fn refresh(&self) {
        let _gate = self.refresh_gate.lock().await;

        // A racing caller may have refreshed while we waited on the gate
        if self.is_fresh().await {
            return;
        }

        let results =
            futures::future::join_all(self.channels.iter().map(|ch| self.fetch_channel(ch))).await;

        let mut combined: Vec<NewsItem> = Vec::new();
        let mut ok = 0;
        for items in results {
            if !items.is_empty() {
                ok += 1;
            }
            combined.extend(items);
        }

        // Stable sort: ties keep their per-channel feed order
        combined.sort_by(|a, b| b.ts.cmp(&a.ts));

        let mut cache = self.cache.write().await;
        cache.items = combined;
        cache.refreshed_at = Utc::now();
        info!(
            "{} items from {}/{} channels",
            cache.items.len(),
            ok,
            self.channels.len()
        );
    }

    /// Fetch one channel's feed. Failure is local: the error is logged and
    /// the channel contributes nothing this cycle.
    pub async fn fetch_channel(&self, channel: &ChannelConfig) -> Vec<NewsItem> {
        match self.try_fetch_channel(channel).await {
            Ok(items) => {
                debug!("Fetched {} items from '{}'", items.len(), channel.name);
                items
            }
            Err(e) => {
                error!("Failed to fetch channel '{}': {}", channel.name, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_channel(
        &self,
        channel: &ChannelConfig,
    ) -> Result<Vec<NewsItem>, FetchError> {
        let response = self.client.get(&channel.url).send().await?;
        let bytes = response.bytes().await?;
        let parsed = parser::parse(&bytes[..])?;

        let limit = channel.limit.unwrap_or(self.channel_limit);
        let now = Utc::now();

        Ok(parsed
            .entries
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, entry)| self.normalize_entry(channel, entry, index, now))
            .collect())
    }

    fn normalize_entry(
        &self,
        channel: &ChannelConfig,
        entry: &feed_rs::model::Entry,
        index: usize,
        now: DateTime<Utc>,
    ) -> NewsItem {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.as_str())
            .unwrap_or_default();
        let title = Self::strip_tags(title).trim().to_string();

        let raw_desc = entry
            .summary
            .as_ref()
            .map(|t| t.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
            .unwrap_or_default();
        let desc = Self::truncate_chars(Self::strip_tags(&raw_desc).trim(), self.description_limit);

        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        let published: Option<DateTime<Utc>> = entry.published.or(entry.updated);

        // Undated items fall back to a synthetic decreasing timestamp so they
        // keep their in-feed relative order instead of colliding at zero.
        let ts = published
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_else(|| now.timestamp_millis() - index as i64 * 60_000);

        let id = if entry.id.is_empty() {
            format!("{}_{}", channel.id, index)
        } else {
            format!("{}_{}", channel.id, entry.id)
        };

        NewsItem {
            id,
            source: channel.id.clone(),
            source_name: channel.name.clone(),
            source_color: channel.color.clone(),
            source_icon: channel.icon.clone(),
            title,
            desc,
            link,
            published,
            time_ago: Self::time_ago(ts, now),
            ts,
        }
    }

    /// Remove markup tags with a simple scan; anything between '<' and the
    /// next '>' is dropped.
    pub fn strip_tags(input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut in_tag = false;
        for c in input.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => out.push(c),
                _ => {}
            }
        }
        out
    }

    /// Truncate to a character budget. Counts characters rather than bytes
    /// since the text is Hebrew.
    pub fn truncate_chars(input: &str, max: usize) -> String {
        input.chars().take(max).collect()
    }

    /// Hebrew relative-time bucket for a millisecond timestamp.
    pub fn time_ago(ts_millis: i64, now: DateTime<Utc>) -> String {
        let diff = (now.timestamp_millis() - ts_millis) / 1000;
        if diff < 90 {
            "לפני דקה".to_string()
        } else if diff < 3600 {
            format!("לפני {} דקות", diff / 60)
        } else if diff < 7200 {
            "לפני שעה".to_string()
        } else if diff < 86400 {
            format!("לפני {} שעות", diff / 3600)
        } else {
            "אתמול".to_string()
        }
    }
}

pub async fn start_background_refresh(aggregator: Arc<Aggregator>, interval: Duration) {
    // Do initial fetch
    info!("Starting initial channel fetch");
    aggregator.refresh().await;

    // Then refresh on every tick; a refresh just triggered by a stale
    // request makes the next tick a no-op via the freshness re-check
    loop {
        tokio::time::sleep(interval).await;
        aggregator.refresh().await;
    }
}
