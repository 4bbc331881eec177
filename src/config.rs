use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Cache freshness window and background refresh period, in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    /// Description character budget (characters, not bytes - the text is Hebrew)
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,
    /// Items taken per channel when the channel has no explicit limit
    #[serde(default = "default_channel_limit")]
    pub channel_limit: usize,
    pub channels: Vec<ChannelConfig>,
}

fn default_cache_ttl() -> u64 {
    5
}

fn default_description_limit() -> usize {
    180
}

fn default_channel_limit() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChannelConfig {
    pub id: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub url: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
