// Channel detail builders - the type-specific half of a channel export.
//
// Routing follows the platform's split: text-like channels archive their
// recent messages (a network read), voice-like channels are a pure mapping,
// and anything else is skipped with a reason the caller can log or assert
// on.

use super::guild_source::{
    ChannelEntry, ChannelKind, GuildSource, MessageEntry, OverwriteKind, RoleEntry, SourceError,
};
use super::snapshot_models::{
    AttachmentRecord, ChannelDetailRecord, ChannelRecord, MessageRecord,
    PermissionOverwriteRecord, SnapshotOptions, TextChannelRecord, VoiceChannelRecord,
};

/// Outcome of building one channel's detail.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelDetail {
    Included(ChannelRecord),
    Skipped { channel_id: u64, reason: SkipReason },
}

/// Why a channel was left out of the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The channel kind has no exportable representation.
    UnsupportedKind(ChannelKind),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedKind(kind) => write!(f, "unsupported channel kind {:?}", kind),
        }
    }
}

/// Export a channel's role permission overwrites.
///
/// Member overwrites and overwrites whose role is absent from the role
/// list are dropped.
pub fn channel_permissions(
    channel: &ChannelEntry,
    roles: &[RoleEntry],
) -> Vec<PermissionOverwriteRecord> {
    channel
        .overwrites
        .iter()
        .filter(|overwrite| overwrite.kind == OverwriteKind::Role)
        .filter_map(|overwrite| {
            let role = roles.iter().find(|role| role.id == overwrite.id)?;
            Some(PermissionOverwriteRecord {
                role_name: role.name.clone(),
                allow: overwrite.allow.to_string(),
                deny: overwrite.deny.to_string(),
            })
        })
        .collect()
}

/// Route one channel to its detail builder.
pub async fn build_channel_detail<S: GuildSource>(
    source: &S,
    channel: &ChannelEntry,
    roles: &[RoleEntry],
    options: &SnapshotOptions,
) -> Result<ChannelDetail, SourceError> {
    match channel.kind {
        ChannelKind::Text | ChannelKind::News => {
            let record = text_channel_record(source, channel, roles, options).await?;
            Ok(ChannelDetail::Included(record))
        }
        ChannelKind::Voice | ChannelKind::Stage => {
            Ok(ChannelDetail::Included(voice_channel_record(channel, roles)))
        }
        kind => Ok(ChannelDetail::Skipped {
            channel_id: channel.id,
            reason: SkipReason::UnsupportedKind(kind),
        }),
    }
}

async fn text_channel_record<S: GuildSource>(
    source: &S,
    channel: &ChannelEntry,
    roles: &[RoleEntry],
    options: &SnapshotOptions,
) -> Result<ChannelRecord, SourceError> {
    let messages = source
        .fetch_channel_messages(channel.id, options.max_messages_per_channel)
        .await?;

    Ok(ChannelRecord {
        old_id: channel.id,
        detail: ChannelDetailRecord::Text(TextChannelRecord {
            name: channel.name.clone(),
            topic: channel.topic.clone(),
            nsfw: channel.nsfw,
            rate_limit_per_user: channel.rate_limit_per_user,
            news: channel.kind == ChannelKind::News,
            permissions: channel_permissions(channel, roles),
            messages: messages.into_iter().map(message_record).collect(),
        }),
    })
}

fn voice_channel_record(channel: &ChannelEntry, roles: &[RoleEntry]) -> ChannelRecord {
    ChannelRecord {
        old_id: channel.id,
        detail: ChannelDetailRecord::Voice(VoiceChannelRecord {
            name: channel.name.clone(),
            bitrate: channel.bitrate,
            user_limit: channel.user_limit,
            permissions: channel_permissions(channel, roles),
        }),
    }
}

fn message_record(message: MessageEntry) -> MessageRecord {
    MessageRecord {
        username: message.username,
        avatar_url: message.avatar_url,
        content: message.content,
        pinned: message.pinned,
        sent_at: message.sent_at,
        attachments: message
            .attachments
            .into_iter()
            .map(|attachment| AttachmentRecord {
                name: attachment.name,
                url: attachment.url,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::guild_source::OverwriteEntry;

    fn role(id: u64, name: &str) -> RoleEntry {
        RoleEntry {
            id,
            name: name.to_string(),
            color: 0,
            hoist: false,
            managed: false,
            mentionable: false,
            permissions: 0,
            position: 0,
        }
    }

    fn channel_with_overwrites(overwrites: Vec<OverwriteEntry>) -> ChannelEntry {
        ChannelEntry {
            id: 10,
            name: "general".to_string(),
            kind: ChannelKind::Voice,
            parent_id: None,
            position: 0,
            topic: None,
            nsfw: false,
            rate_limit_per_user: None,
            bitrate: Some(64_000),
            user_limit: Some(5),
            overwrites,
        }
    }

    #[test]
    fn permissions_keep_only_resolvable_role_overwrites() {
        let roles = vec![role(1, "Mods")];
        let channel = channel_with_overwrites(vec![
            OverwriteEntry {
                kind: OverwriteKind::Role,
                id: 1,
                allow: 1024,
                deny: 2048,
            },
            // Member overwrites are not exported
            OverwriteEntry {
                kind: OverwriteKind::Member,
                id: 42,
                allow: 1024,
                deny: 0,
            },
            // Role no longer in the cache
            OverwriteEntry {
                kind: OverwriteKind::Role,
                id: 99,
                allow: 0,
                deny: 0,
            },
        ]);

        let exported = channel_permissions(&channel, &roles);

        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].role_name, "Mods");
        assert_eq!(exported[0].allow, "1024");
        assert_eq!(exported[0].deny, "2048");
    }

    #[test]
    fn voice_record_carries_bitrate_and_user_limit() {
        let channel = channel_with_overwrites(Vec::new());

        let record = voice_channel_record(&channel, &[]);

        assert_eq!(record.old_id, 10);
        match record.detail {
            ChannelDetailRecord::Voice(voice) => {
                assert_eq!(voice.name, "general");
                assert_eq!(voice.bitrate, Some(64_000));
                assert_eq!(voice.user_limit, Some(5));
            }
            other => panic!("expected voice detail, got {:?}", other),
        }
    }

    #[test]
    fn skip_reason_names_the_kind() {
        let reason = SkipReason::UnsupportedKind(ChannelKind::Forum);
        assert_eq!(reason.to_string(), "unsupported channel kind Forum");
    }
}
