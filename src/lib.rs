// Guild snapshot extraction - the read/export side of a guild backup tool.
//
// **Architecture Overview:**
// - `core/` = Snapshot logic (platform-agnostic)
// - `infra/` = Implementations of core traits (serenity session, HTTP)
//
// Callers construct a `SerenityGuildSource` from a connected client's http
// handle and cache, wrap it in a `SnapshotService`, and call the extraction
// functions - or `snapshot` for the whole document at once.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with a pair of mod.rs files that both look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;

pub use crate::core::snapshot::{
    BanRecord, ChannelTree, EmojiRecord, GuildSnapshot, GuildSource, MemberRecord, RoleRecord,
    SaveImages, SnapshotError, SnapshotOptions, SnapshotService, SourceError,
};
pub use crate::infra::discord::{ImageClient, SerenityGuildSource};
