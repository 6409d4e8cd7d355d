pub mod channel_detail;
pub mod guild_source;
pub mod snapshot_models;
pub mod snapshot_service;

pub use channel_detail::{ChannelDetail, SkipReason};
pub use guild_source::{GuildSource, SourceError};
pub use snapshot_models::{
    AttachmentRecord, BanRecord, CategoryRecord, ChannelDetailRecord, ChannelRecord, ChannelTree,
    EmojiImage, EmojiRecord, GuildSnapshot, MemberRecord, MessageRecord,
    PermissionOverwriteRecord, RoleRecord, SaveImages, SnapshotOptions, TextChannelRecord,
    VoiceChannelRecord,
};
pub use snapshot_service::{SnapshotError, SnapshotService, EMOJI_EXPORT_CAP};
