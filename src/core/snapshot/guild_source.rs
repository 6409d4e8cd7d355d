// The guild source port - what the snapshot service needs from a connected
// session. The core defines the contract in primitive terms; the infra
// layer provides the serenity implementation, and tests provide mocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The platform client rejected or failed a request (missing
    /// permission, missing intent, connectivity loss).
    #[error("Platform API error: {0}")]
    Api(String),

    /// A raw HTTP fetch (emoji image bytes) failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The guild is not present in the local cache.
    #[error("Guild {0} not found in cache")]
    CacheMiss(u64),
}

/// A ban as the platform reports it.
#[derive(Debug, Clone)]
pub struct BanEntry {
    pub user_id: u64,
    pub reason: Option<String>,
}

/// A member as the platform reports it.
#[derive(Debug, Clone)]
pub struct MemberEntry {
    pub user_id: u64,
    pub username: String,
    pub discriminator: String,
    pub avatar_url: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
    pub roles: Vec<u64>,
    pub bot: bool,
}

/// A role as the platform cache holds it.
#[derive(Debug, Clone)]
pub struct RoleEntry {
    pub id: u64,
    pub name: String,
    /// Packed 0xRRGGBB.
    pub color: u32,
    pub hoist: bool,
    pub managed: bool,
    pub mentionable: bool,
    pub permissions: u64,
    pub position: u16,
}

/// A custom emoji as the platform cache holds it.
#[derive(Debug, Clone)]
pub struct EmojiEntry {
    pub id: u64,
    pub name: String,
    pub url: String,
}

/// The channel kinds the extractor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    News,
    Voice,
    Stage,
    Category,
    PublicThread,
    PrivateThread,
    NewsThread,
    Forum,
    Other,
}

impl ChannelKind {
    pub fn is_thread(self) -> bool {
        matches!(
            self,
            ChannelKind::PublicThread | ChannelKind::PrivateThread | ChannelKind::NewsThread
        )
    }
}

/// Who a permission overwrite targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteKind {
    Role,
    Member,
}

/// A permission overwrite as the platform cache holds it.
#[derive(Debug, Clone)]
pub struct OverwriteEntry {
    pub kind: OverwriteKind,
    /// Role id or user id, depending on `kind`.
    pub id: u64,
    pub allow: u64,
    pub deny: u64,
}

/// A channel as the platform cache holds it. Fields that only apply to one
/// channel kind (topic, bitrate, ...) are simply absent on the others.
#[derive(Debug, Clone)]
pub struct ChannelEntry {
    pub id: u64,
    pub name: String,
    pub kind: ChannelKind,
    pub parent_id: Option<u64>,
    pub position: u16,
    pub topic: Option<String>,
    pub nsfw: bool,
    pub rate_limit_per_user: Option<u16>,
    pub bitrate: Option<u32>,
    pub user_limit: Option<u32>,
    pub overwrites: Vec<OverwriteEntry>,
}

/// An attachment on a fetched message.
#[derive(Debug, Clone)]
pub struct AttachmentEntry {
    pub name: String,
    pub url: String,
}

/// A message fetched from a text channel.
#[derive(Debug, Clone)]
pub struct MessageEntry {
    pub username: String,
    pub avatar_url: Option<String>,
    pub content: String,
    pub pinned: bool,
    pub sent_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentEntry>,
}

/// Read access to a connected guild session.
///
/// The `fetch_*` methods go to the network; the rest are reads of the
/// session's local cache and fail only when the guild itself is missing
/// from it.
#[async_trait]
pub trait GuildSource: Send + Sync {
    fn guild_id(&self) -> u64;

    fn name(&self) -> Result<String, SourceError>;

    fn icon_url(&self) -> Result<Option<String>, SourceError>;

    /// Fetch the complete ban list. Requires the ban-members permission.
    async fn fetch_bans(&self) -> Result<Vec<BanEntry>, SourceError>;

    /// Fetch the complete member list. The local cache is not guaranteed
    /// complete, so implementations must not answer from it alone.
    async fn fetch_members(&self) -> Result<Vec<MemberEntry>, SourceError>;

    fn roles(&self) -> Result<Vec<RoleEntry>, SourceError>;

    fn emojis(&self) -> Result<Vec<EmojiEntry>, SourceError>;

    fn channels(&self) -> Result<Vec<ChannelEntry>, SourceError>;

    /// Fetch up to `limit` of the channel's most recent messages, oldest
    /// first.
    async fn fetch_channel_messages(
        &self,
        channel_id: u64,
        limit: u8,
    ) -> Result<Vec<MessageEntry>, SourceError>;

    /// Download the raw bytes behind an image URL.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}
