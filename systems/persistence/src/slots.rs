//! Save slots, progress records and the persistence state machine.

use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use training_defence_core::{GameSnapshot, MapId, SLOT_COUNT};

use crate::{
    codec::{decode_snapshot, encode_snapshot, SnapshotError},
    store::{KeyValueStore, StoreError},
};

/// Key of the single save written before slots existed.
pub const LEGACY_SAVE_KEY: &str = "training.save";
/// Key holding the active slot number.
pub const ACTIVE_SLOT_KEY: &str = "training.activeSlot";
/// Key holding the auto-resume flag.
pub const AUTO_RESUME_KEY: &str = "training.autoResume";
/// Key holding the campaign position.
pub const CAMPAIGN_KEY: &str = "training.campaign";
/// Key holding the daily record.
pub const DAILY_KEY: &str = "training.daily";
/// Key holding the global leaderboard.
pub const LEADERBOARD_KEY: &str = "training.leaderboard";
/// File name suggested for snapshot exports.
pub const EXPORT_FILE_NAME: &str = "training-save.json";

/// Addresses one of the save slots, numbered from one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    /// The first slot, target of legacy migration.
    pub const FIRST: SlotId = SlotId(1);

    /// Creates a slot id when `number` lies in `1..=SLOT_COUNT`.
    #[must_use]
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number <= SLOT_COUNT {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Slot number.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Every slot in ascending order.
    pub fn all() -> impl Iterator<Item = SlotId> {
        (1..=SLOT_COUNT).map(SlotId)
    }

    /// Store key of the slot.
    #[must_use]
    pub fn key(&self) -> String {
        format!("training.slot.{}", self.0)
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when parsing a slot number fails.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("slot '{0}' does not exist; expected 1 to {max}", max = SLOT_COUNT)]
pub struct ParseSlotError(String);

impl FromStr for SlotId {
    type Err = ParseSlotError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(SlotId::new)
            .ok_or_else(|| ParseSlotError(value.to_owned()))
    }
}

/// Failures surfaced by [`Persistence`].
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A stored or imported snapshot was rejected.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// A progress record could not be parsed.
    #[error("stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        /// Offending key.
        key: &'static str,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },
    /// A progress record could not be serialised.
    #[error("value for '{key}' could not be encoded: {source}")]
    Encode {
        /// Target key.
        key: &'static str,
        /// Serialisation failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Result of a load request.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    /// The snapshot was accepted and applied.
    Applied,
    /// The slot holds no snapshot.
    Empty,
    /// The snapshot was rejected; the prior state stays authoritative.
    Rejected(String),
}

/// Summary of a slot for a picker.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotPreview {
    /// Nothing saved.
    Empty,
    /// A readable snapshot.
    Saved {
        /// Wave counter.
        wave: u32,
        /// Credits held.
        money: u32,
        /// Lives left.
        lives: u32,
        /// Map played.
        map: MapId,
        /// Unix milliseconds of the save.
        saved_at: i64,
    },
    /// The slot holds data that does not decode.
    Unreadable(String),
}

impl fmt::Display for SlotPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty"),
            Self::Saved {
                wave,
                money,
                lives,
                map,
                ..
            } => write!(f, "wave {wave}, {money} credits, {lives} lives on {map}"),
            Self::Unreadable(reason) => write!(f, "unreadable ({reason})"),
        }
    }
}

/// Slot manager and progress store over an injected key-value store.
///
/// Stores are synchronous, so a save or load runs its whole transition inside
/// one call: a save returns to idle with its `Result`, a load ends in a
/// [`LoadOutcome`] once the engine has applied or rejected the snapshot.
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Wraps the provided store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Writes a snapshot into a slot.
    pub fn save_slot(
        &mut self,
        slot: SlotId,
        snapshot: &GameSnapshot,
    ) -> Result<(), PersistenceError> {
        let result = encode_snapshot(snapshot)
            .map_err(PersistenceError::from)
            .and_then(|text| self.store.set(&slot.key(), &text).map_err(Into::into));
        if result.is_ok() {
            debug!(slot = slot.get(), wave = snapshot.wave, "slot saved");
        }
        result
    }

    /// Reads and validates the snapshot held by a slot.
    ///
    /// Slot 1 adopts the legacy single save the first time it is read while
    /// empty.
    pub fn load_slot(&mut self, slot: SlotId) -> Result<Option<GameSnapshot>, PersistenceError> {
        let result = self.read_slot(slot);
        if let Err(error) = &result {
            warn!(slot = slot.get(), %error, "slot load rejected");
        }
        result
    }

    /// Removes the snapshot of a slot.
    pub fn clear_slot(&mut self, slot: SlotId) -> Result<(), PersistenceError> {
        self.store.remove(&slot.key())?;
        if slot == SlotId::FIRST {
            self.store.remove(LEGACY_SAVE_KEY)?;
        }
        Ok(())
    }

    /// Summaries of every slot.
    pub fn previews(&mut self) -> Vec<(SlotId, SlotPreview)> {
        SlotId::all()
            .map(|slot| {
                let preview = match self.read_slot(slot) {
                    Ok(None) => SlotPreview::Empty,
                    Ok(Some(snapshot)) => SlotPreview::Saved {
                        wave: snapshot.wave,
                        money: snapshot.money,
                        lives: snapshot.lives,
                        map: snapshot.map_id,
                        saved_at: snapshot.saved_at,
                    },
                    Err(error) => SlotPreview::Unreadable(error.to_string()),
                };
                (slot, preview)
            })
            .collect()
    }

    fn read_slot(&mut self, slot: SlotId) -> Result<Option<GameSnapshot>, PersistenceError> {
        let key = slot.key();
        let mut text = self.store.get(&key)?;
        if text.is_none() && slot == SlotId::FIRST {
            if let Some(legacy) = self.store.get(LEGACY_SAVE_KEY)? {
                self.store.set(&key, &legacy)?;
                self.store.remove(LEGACY_SAVE_KEY)?;
                info!("legacy save migrated into slot 1");
                text = Some(legacy);
            }
        }
        match text {
            Some(text) => Ok(Some(decode_snapshot(&text)?)),
            None => Ok(None),
        }
    }

    /// Active slot, slot 1 when unset or invalid.
    pub fn active_slot(&self) -> Result<SlotId, PersistenceError> {
        Ok(self
            .store
            .get(ACTIVE_SLOT_KEY)?
            .and_then(|value| value.parse().ok())
            .unwrap_or_default())
    }

    /// Persists the active slot.
    pub fn set_active_slot(&mut self, slot: SlotId) -> Result<(), PersistenceError> {
        self.store.set(ACTIVE_SLOT_KEY, &slot.to_string())?;
        Ok(())
    }

    /// Auto-resume flag; enabled unless explicitly switched off.
    pub fn auto_resume(&self) -> Result<bool, PersistenceError> {
        Ok(self.store.get(AUTO_RESUME_KEY)?.as_deref() != Some("0"))
    }

    /// Persists the auto-resume flag.
    pub fn set_auto_resume(&mut self, enabled: bool) -> Result<(), PersistenceError> {
        self.store
            .set(AUTO_RESUME_KEY, if enabled { "1" } else { "0" })?;
        Ok(())
    }

    /// Reads a JSON progress record, falling back to its default when absent.
    pub fn load_record<T>(&self, key: &'static str) -> Result<T, PersistenceError>
    where
        T: DeserializeOwned + Default,
    {
        match self.store.get(key)? {
            Some(text) => serde_json::from_str(&text)
                .map_err(|source| PersistenceError::Corrupt { key, source }),
            None => Ok(T::default()),
        }
    }

    /// Writes a JSON progress record.
    pub fn save_record<T: Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), PersistenceError> {
        let text =
            serde_json::to_string(value).map_err(|source| PersistenceError::Encode { key, source })?;
        self.store.set(key, &text)?;
        Ok(())
    }
}
