// Serenity-backed implementation of the GuildSource port.
//
// Cache reads clone the guild out of the cache guard before doing any
// other work; the guard must not be held across an await point.

use std::num::NonZeroU16;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::GetMessages;
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::prelude::*;

use super::image_client::ImageClient;
use crate::core::snapshot::guild_source::{
    AttachmentEntry, BanEntry, ChannelEntry, ChannelKind, EmojiEntry, GuildSource, MemberEntry,
    MessageEntry, OverwriteEntry, OverwriteKind, RoleEntry, SourceError,
};

/// Most members one list page may return.
const MEMBER_PAGE_SIZE: u64 = 1000;

/// Reads a guild through a connected serenity session: the gateway cache
/// for roles, emojis and channels, the HTTP client for bans, members and
/// messages.
pub struct SerenityGuildSource {
    http: Arc<Http>,
    cache: Arc<Cache>,
    guild_id: GuildId,
    images: ImageClient,
}

impl SerenityGuildSource {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>, guild_id: GuildId) -> Self {
        Self {
            http,
            cache,
            guild_id,
            images: ImageClient::new(),
        }
    }

    fn guild(&self) -> Result<Guild, SourceError> {
        self.guild_id
            .to_guild_cached(&self.cache)
            .map(|guild| guild.clone())
            .ok_or(SourceError::CacheMiss(self.guild_id.get()))
    }
}

#[async_trait]
impl GuildSource for SerenityGuildSource {
    fn guild_id(&self) -> u64 {
        self.guild_id.get()
    }

    fn name(&self) -> Result<String, SourceError> {
        Ok(self.guild()?.name)
    }

    fn icon_url(&self) -> Result<Option<String>, SourceError> {
        Ok(self.guild()?.icon_url())
    }

    async fn fetch_bans(&self) -> Result<Vec<BanEntry>, SourceError> {
        let bans = self
            .guild_id
            .bans(&self.http, None, None)
            .await
            .map_err(|e| SourceError::Api(e.to_string()))?;

        Ok(bans
            .iter()
            .map(|ban| BanEntry {
                user_id: ban.user.id.get(),
                reason: ban.reason.clone(),
            })
            .collect())
    }

    async fn fetch_members(&self) -> Result<Vec<MemberEntry>, SourceError> {
        // The gateway cache is only complete on small guilds; walk the
        // member list pages instead of trusting it.
        let mut entries = Vec::new();
        let mut after: Option<UserId> = None;

        loop {
            let page = self
                .guild_id
                .members(&self.http, Some(MEMBER_PAGE_SIZE), after)
                .await
                .map_err(|e| SourceError::Api(e.to_string()))?;

            let page_len = page.len() as u64;
            after = page.last().map(|member| member.user.id);
            entries.extend(page.iter().map(member_entry));

            if page_len < MEMBER_PAGE_SIZE {
                break;
            }
        }

        Ok(entries)
    }

    fn roles(&self) -> Result<Vec<RoleEntry>, SourceError> {
        Ok(self.guild()?.roles.values().map(role_entry).collect())
    }

    fn emojis(&self) -> Result<Vec<EmojiEntry>, SourceError> {
        Ok(self.guild()?.emojis.values().map(emoji_entry).collect())
    }

    fn channels(&self) -> Result<Vec<ChannelEntry>, SourceError> {
        Ok(self.guild()?.channels.values().map(channel_entry).collect())
    }

    async fn fetch_channel_messages(
        &self,
        channel_id: u64,
        limit: u8,
    ) -> Result<Vec<MessageEntry>, SourceError> {
        let messages = ChannelId::new(channel_id)
            .messages(&self.http, GetMessages::new().limit(limit))
            .await
            .map_err(|e| SourceError::Api(e.to_string()))?;

        // The API returns newest first; the snapshot stores oldest first.
        Ok(messages.iter().rev().map(message_entry).collect())
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.images.fetch(url).await
    }
}

fn channel_kind(kind: ChannelType) -> ChannelKind {
    match kind {
        ChannelType::Text => ChannelKind::Text,
        ChannelType::News => ChannelKind::News,
        ChannelType::Voice => ChannelKind::Voice,
        ChannelType::Stage => ChannelKind::Stage,
        ChannelType::Category => ChannelKind::Category,
        ChannelType::PublicThread => ChannelKind::PublicThread,
        ChannelType::PrivateThread => ChannelKind::PrivateThread,
        ChannelType::NewsThread => ChannelKind::NewsThread,
        ChannelType::Forum => ChannelKind::Forum,
        _ => ChannelKind::Other,
    }
}

/// Discord renders accounts migrated off discriminators as "0".
fn discriminator_string(discriminator: Option<NonZeroU16>) -> String {
    match discriminator {
        Some(d) => format!("{:04}", d.get()),
        None => "0".to_string(),
    }
}

fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0)
}

fn member_entry(member: &Member) -> MemberEntry {
    MemberEntry {
        user_id: member.user.id.get(),
        username: member.user.name.clone(),
        discriminator: discriminator_string(member.user.discriminator),
        avatar_url: member.user.avatar_url(),
        joined_at: member.joined_at.and_then(to_datetime),
        roles: member.roles.iter().map(|id| id.get()).collect(),
        bot: member.user.bot,
    }
}

fn role_entry(role: &Role) -> RoleEntry {
    RoleEntry {
        id: role.id.get(),
        name: role.name.clone(),
        color: role.colour.0,
        hoist: role.hoist,
        managed: role.managed,
        mentionable: role.mentionable,
        permissions: role.permissions.bits(),
        position: role.position,
    }
}

fn emoji_entry(emoji: &Emoji) -> EmojiEntry {
    EmojiEntry {
        id: emoji.id.get(),
        name: emoji.name.clone(),
        url: emoji.url(),
    }
}

fn overwrite_entry(overwrite: &PermissionOverwrite) -> Option<OverwriteEntry> {
    let (kind, id) = match overwrite.kind {
        PermissionOverwriteType::Role(role_id) => (OverwriteKind::Role, role_id.get()),
        PermissionOverwriteType::Member(user_id) => (OverwriteKind::Member, user_id.get()),
        _ => return None,
    };

    Some(OverwriteEntry {
        kind,
        id,
        allow: overwrite.allow.bits(),
        deny: overwrite.deny.bits(),
    })
}

fn channel_entry(channel: &GuildChannel) -> ChannelEntry {
    ChannelEntry {
        id: channel.id.get(),
        name: channel.name.clone(),
        kind: channel_kind(channel.kind),
        parent_id: channel.parent_id.map(|id| id.get()),
        position: channel.position,
        topic: channel.topic.clone(),
        nsfw: channel.nsfw,
        rate_limit_per_user: channel.rate_limit_per_user,
        bitrate: channel.bitrate,
        user_limit: channel.user_limit,
        overwrites: channel
            .permission_overwrites
            .iter()
            .filter_map(overwrite_entry)
            .collect(),
    }
}

fn message_entry(message: &Message) -> MessageEntry {
    MessageEntry {
        username: message.author.name.clone(),
        avatar_url: message.author.avatar_url(),
        content: message.content.clone(),
        pinned: message.pinned,
        sent_at: to_datetime(message.timestamp).unwrap_or_default(),
        attachments: message
            .attachments
            .iter()
            .map(|attachment| AttachmentEntry {
                name: attachment.filename.clone(),
                url: attachment.url.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_kinds_map_to_thread_variants() {
        assert_eq!(
            channel_kind(ChannelType::PublicThread),
            ChannelKind::PublicThread
        );
        assert!(channel_kind(ChannelType::PublicThread).is_thread());
        assert!(channel_kind(ChannelType::PrivateThread).is_thread());
        assert!(channel_kind(ChannelType::NewsThread).is_thread());
        assert!(!channel_kind(ChannelType::Text).is_thread());
    }

    #[test]
    fn category_and_text_kinds_survive_the_mapping() {
        assert_eq!(channel_kind(ChannelType::Category), ChannelKind::Category);
        assert_eq!(channel_kind(ChannelType::Text), ChannelKind::Text);
        assert_eq!(channel_kind(ChannelType::News), ChannelKind::News);
        assert_eq!(channel_kind(ChannelType::Voice), ChannelKind::Voice);
        assert_eq!(channel_kind(ChannelType::Forum), ChannelKind::Forum);
    }

    #[test]
    fn discriminators_are_zero_padded() {
        assert_eq!(discriminator_string(NonZeroU16::new(1)), "0001");
        assert_eq!(discriminator_string(NonZeroU16::new(9921)), "9921");
        assert_eq!(discriminator_string(None), "0");
    }

    #[test]
    fn timestamps_convert_to_utc_datetimes() {
        let ts = Timestamp::from_unix_timestamp(1_700_000_000).unwrap();
        let dt = to_datetime(ts).unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }
}
