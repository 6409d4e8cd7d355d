// The snapshot service - the five extraction operations over a guild
// source, plus the composition of all of them into one document.
//
// Everything here is sequential and awaited in order, so output ordering
// is deterministic. The one concurrent region is the base64 emoji path,
// which joins its image fetches with bounded concurrency and only returns
// once every fetch has settled.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use futures::stream::{self, StreamExt};

use super::channel_detail::{build_channel_detail, channel_permissions, ChannelDetail};
use super::guild_source::{ChannelEntry, ChannelKind, EmojiEntry, GuildSource, SourceError};
use super::snapshot_models::{
    BanRecord, CategoryRecord, ChannelTree, EmojiImage, EmojiRecord, GuildSnapshot, MemberRecord,
    RoleRecord, SaveImages, SnapshotOptions,
};

/// Most emojis one snapshot will carry.
pub const EMOJI_EXPORT_CAP: usize = 50;

/// In-flight image downloads on the base64 path.
const EMOJI_FETCH_CONCURRENCY: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Extracts snapshot records from a connected guild session.
///
/// Bans, members, roles and channels are atomic: the first source error
/// aborts the call with no partial result. Emoji image downloads are
/// best-effort per item; a failed download is logged and that emoji is
/// dropped from the output.
pub struct SnapshotService<S: GuildSource> {
    source: S,
}

impl<S: GuildSource> SnapshotService<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The banned users of the guild.
    pub async fn get_bans(&self) -> Result<Vec<BanRecord>, SnapshotError> {
        let bans = self.source.fetch_bans().await?;

        Ok(bans
            .into_iter()
            .map(|ban| BanRecord {
                id: ban.user_id,
                reason: ban.reason,
            })
            .collect())
    }

    /// The current members of the guild, from a complete fetch rather than
    /// the local cache.
    pub async fn get_members(&self) -> Result<Vec<MemberRecord>, SnapshotError> {
        let members = self.source.fetch_members().await?;

        Ok(members
            .into_iter()
            .map(|member| MemberRecord {
                user_id: member.user_id,
                username: member.username,
                discriminator: member.discriminator,
                avatar_url: member.avatar_url,
                joined_at: member.joined_at,
                roles: member.roles,
                bot: member.bot,
            })
            .collect())
    }

    /// The non-managed roles of the guild, highest position first.
    pub fn get_roles(&self) -> Result<Vec<RoleRecord>, SnapshotError> {
        let guild_id = self.source.guild_id();
        let mut roles = self.source.roles()?;

        roles.retain(|role| !role.managed);
        roles.sort_by(|a, b| b.position.cmp(&a.position));

        Ok(roles
            .into_iter()
            .map(|role| RoleRecord {
                old_id: role.id,
                name: role.name,
                color: format!("#{:06x}", role.color),
                hoist: role.hoist,
                permissions: role.permissions.to_string(),
                mentionable: role.mentionable,
                position: role.position,
                is_everyone: role.id == guild_id,
            })
            .collect())
    }

    /// Up to [`EMOJI_EXPORT_CAP`] custom emojis.
    ///
    /// With [`SaveImages::Base64`] every image is downloaded before this
    /// returns; a failed download drops that emoji and warns. Record order
    /// follows the cache's candidate order either way.
    pub async fn get_emojis(
        &self,
        options: &SnapshotOptions,
    ) -> Result<Vec<EmojiRecord>, SnapshotError> {
        // Truncate before any fetch starts so the cap bounds work, not
        // just output size.
        let candidates: Vec<EmojiEntry> = self
            .source
            .emojis()?
            .into_iter()
            .take(EMOJI_EXPORT_CAP)
            .collect();

        match options.save_images {
            SaveImages::Url => Ok(candidates
                .into_iter()
                .map(|emoji| EmojiRecord {
                    name: emoji.name,
                    image: EmojiImage::Url(emoji.url),
                })
                .collect()),
            SaveImages::Base64 => {
                let downloads = candidates.into_iter().map(|emoji| async move {
                    match self.source.fetch_image(&emoji.url).await {
                        Ok(bytes) => Some(EmojiRecord {
                            name: emoji.name,
                            image: EmojiImage::Base64(BASE64.encode(bytes)),
                        }),
                        Err(e) => {
                            tracing::warn!("Failed to download emoji {}: {}", emoji.name, e);
                            None
                        }
                    }
                });

                let settled: Vec<Option<EmojiRecord>> = stream::iter(downloads)
                    .buffered(EMOJI_FETCH_CONCURRENCY)
                    .collect()
                    .await;

                Ok(settled.into_iter().flatten().collect())
            }
        }
    }

    /// The channel hierarchy: categories (ascending by position, children
    /// ascending within each) and parentless channels, with categories and
    /// threads excluded from the latter.
    pub async fn get_channels(
        &self,
        options: &SnapshotOptions,
    ) -> Result<ChannelTree, SnapshotError> {
        let all = self.source.channels()?;
        let roles = self.source.roles()?;

        let mut tree = ChannelTree::default();

        let mut categories: Vec<&ChannelEntry> = all
            .iter()
            .filter(|channel| channel.kind == ChannelKind::Category)
            .collect();
        categories.sort_by_key(|category| category.position);

        for category in categories {
            let mut children: Vec<&ChannelEntry> = all
                .iter()
                .filter(|channel| channel.parent_id == Some(category.id))
                .collect();
            children.sort_by_key(|child| child.position);

            let mut record = CategoryRecord {
                name: category.name.clone(),
                permissions: channel_permissions(category, &roles),
                children: Vec::new(),
            };

            for child in children {
                match build_channel_detail(&self.source, child, &roles, options).await? {
                    ChannelDetail::Included(channel) => record.children.push(channel),
                    ChannelDetail::Skipped { channel_id, reason } => {
                        tracing::debug!("Skipping channel {}: {}", channel_id, reason);
                    }
                }
            }

            tree.categories.push(record);
        }

        let mut others: Vec<&ChannelEntry> = all
            .iter()
            .filter(|channel| {
                channel.parent_id.is_none()
                    && channel.kind != ChannelKind::Category
                    && !channel.kind.is_thread()
            })
            .collect();
        others.sort_by_key(|channel| channel.position);

        for channel in others {
            match build_channel_detail(&self.source, channel, &roles, options).await? {
                ChannelDetail::Included(channel) => tree.others.push(channel),
                ChannelDetail::Skipped { channel_id, reason } => {
                    tracing::debug!("Skipping channel {}: {}", channel_id, reason);
                }
            }
        }

        Ok(tree)
    }

    /// Run every extraction and assemble the full snapshot document.
    pub async fn snapshot(
        &self,
        options: &SnapshotOptions,
    ) -> Result<GuildSnapshot, SnapshotError> {
        Ok(GuildSnapshot {
            guild_id: self.source.guild_id(),
            name: self.source.name()?,
            icon_url: self.source.icon_url()?,
            created_at: Utc::now(),
            bans: self.get_bans().await?,
            members: self.get_members().await?,
            roles: self.get_roles()?,
            emojis: self.get_emojis(options).await?,
            channels: self.get_channels(options).await?,
        })
    }
}
