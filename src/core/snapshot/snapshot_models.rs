// Snapshot domain models - the value objects a guild export is made of.
//
// These are pure data types with no Discord dependencies. The infra layer
// maps platform entities into them, and the restore side of the tool
// consumes them as-is, so every shape here is a serde value object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How emoji images are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveImages {
    /// Keep the CDN URL of each image.
    #[default]
    Url,
    /// Download each image and inline it as base64.
    Base64,
}

/// Options controlling what an extraction captures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOptions {
    pub save_images: SaveImages,
    /// How many recent messages to archive per text channel.
    /// The platform caps one page at 100.
    pub max_messages_per_channel: u8,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            save_images: SaveImages::Url,
            max_messages_per_channel: 10,
        }
    }
}

/// A banned user at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub id: u64,
    pub reason: Option<String>,
}

/// One guild member at capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub user_id: u64,
    pub username: String,
    /// Rendered as the platform shows it: "0042", or "0" for accounts
    /// migrated off discriminators.
    pub discriminator: String,
    pub avatar_url: Option<String>,
    pub joined_at: Option<DateTime<Utc>>,
    pub roles: Vec<u64>,
    pub bot: bool,
}

/// One non-managed role at capture time.
///
/// `old_id` is the id the role had in the source guild; the restore side
/// maps it to the freshly created role's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub old_id: u64,
    pub name: String,
    /// "#rrggbb"
    pub color: String,
    pub hoist: bool,
    /// Decimal permission bitfield. Kept as a string so the snapshot
    /// survives JSON tooling that mangles 64-bit integers.
    pub permissions: String,
    pub mentionable: bool,
    pub position: u16,
    /// True for the implicit everyone role (the role whose id equals the
    /// guild id).
    pub is_everyone: bool,
}

/// A custom emoji, either by URL or with the image inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiRecord {
    pub name: String,
    #[serde(flatten)]
    pub image: EmojiImage,
}

/// Serializes as either a `url` or a `base64` key, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiImage {
    Url(String),
    Base64(String),
}

/// One role overwrite on a channel or category.
///
/// Keyed by role name rather than id so the overwrite can be re-applied to
/// freshly created roles whose ids differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwriteRecord {
    pub role_name: String,
    pub allow: String,
    pub deny: String,
}

/// An attachment on an archived message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub name: String,
    pub url: String,
}

/// One archived message, oldest first within its channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub username: String,
    pub avatar_url: Option<String>,
    pub content: String,
    pub pinned: bool,
    pub sent_at: DateTime<Utc>,
    pub attachments: Vec<AttachmentRecord>,
}

/// Detail for a text or announcement channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChannelRecord {
    pub name: String,
    pub topic: Option<String>,
    pub nsfw: bool,
    pub rate_limit_per_user: Option<u16>,
    /// True for announcement channels.
    pub news: bool,
    pub permissions: Vec<PermissionOverwriteRecord>,
    pub messages: Vec<MessageRecord>,
}

/// Detail for a voice or stage channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceChannelRecord {
    pub name: String,
    pub bitrate: Option<u32>,
    pub user_limit: Option<u32>,
    pub permissions: Vec<PermissionOverwriteRecord>,
}

/// Type-specific channel detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel_type", rename_all = "lowercase")]
pub enum ChannelDetailRecord {
    Text(TextChannelRecord),
    Voice(VoiceChannelRecord),
}

/// One exported channel: its original id plus type-specific detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub old_id: u64,
    #[serde(flatten)]
    pub detail: ChannelDetailRecord,
}

/// A category and its children, children ascending by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    pub permissions: Vec<PermissionOverwriteRecord>,
    pub children: Vec<ChannelRecord>,
}

/// The channel hierarchy: categorized channels and top-level ones.
///
/// `others` holds channels with no parent category; categories themselves
/// and threads never appear in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTree {
    pub categories: Vec<CategoryRecord>,
    pub others: Vec<ChannelRecord>,
}

/// A complete guild snapshot, ready to be persisted or replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSnapshot {
    pub guild_id: u64,
    pub name: String,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub bans: Vec<BanRecord>,
    pub members: Vec<MemberRecord>,
    pub roles: Vec<RoleRecord>,
    pub emojis: Vec<EmojiRecord>,
    pub channels: ChannelTree,
}
