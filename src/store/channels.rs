//! Channel allowlist store.
//!
//! Commands are only honored in explicitly allowed channels. A missing
//! file means nothing is allowed — deny by default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct AllowedChannels {
    #[serde(default)]
    allowed_channels: Vec<GuildEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GuildEntry {
    guild: String,
    channels: Vec<String>,
}

/// File-backed channel allowlist, keyed by guild
#[derive(Clone, Debug)]
pub struct ChannelStore {
    path: PathBuf,
}

impl ChannelStore {
    /// Create a store backed by the given file path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    async fn load(&self) -> Result<AllowedChannels> {
        Ok(super::read_json(&self.path).await?.unwrap_or_default())
    }

    /// Whether commands from this channel should be honored
    pub async fn is_allowed(&self, guild_id: &str, channel_id: &str) -> Result<bool> {
        let data = self.load().await?;
        Ok(data
            .allowed_channels
            .iter()
            .find(|g| g.guild == guild_id)
            .is_some_and(|g| g.channels.iter().any(|c| c == channel_id)))
    }

    /// Add a channel to a guild's allowlist. Idempotent.
    pub async fn allow(&self, guild_id: &str, channel_id: &str) -> Result<()> {
        let mut data = self.load().await?;

        match data.allowed_channels.iter_mut().find(|g| g.guild == guild_id) {
            Some(entry) => {
                if !entry.channels.iter().any(|c| c == channel_id) {
                    entry.channels.push(channel_id.to_string());
                }
            }
            None => data.allowed_channels.push(GuildEntry {
                guild: guild_id.to_string(),
                channels: vec![channel_id.to_string()],
            }),
        }

        super::write_json(&self.path, &data).await
    }

    /// Remove a channel from a guild's allowlist, dropping the guild entry
    /// when its last channel goes. Idempotent.
    pub async fn disallow(&self, guild_id: &str, channel_id: &str) -> Result<()> {
        let mut data = self.load().await?;

        if let Some(entry) = data.allowed_channels.iter_mut().find(|g| g.guild == guild_id) {
            entry.channels.retain(|c| c != channel_id);
        }
        data.allowed_channels.retain(|g| !g.channels.is_empty());

        super::write_json(&self.path, &data).await
    }
}
