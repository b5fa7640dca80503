#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Versioned snapshot persistence over an injected key-value store.
//!
//! Snapshots are JSON documents tagged with an integer version. Loading checks
//! the tag before touching any other field so that payloads from unknown
//! builds are rejected without side effects.

pub mod codec;
pub mod slots;
pub mod store;

pub use codec::{decode_snapshot, encode_snapshot, encode_snapshot_pretty, SnapshotError};
pub use slots::{
    LoadOutcome, ParseSlotError, Persistence, PersistenceError, SlotId,
    SlotPreview, ACTIVE_SLOT_KEY, AUTO_RESUME_KEY, CAMPAIGN_KEY, DAILY_KEY, EXPORT_FILE_NAME,
    LEADERBOARD_KEY, LEGACY_SAVE_KEY,
};
pub use store::{DirectoryStore, KeyValueStore, MemoryStore, StoreError};
