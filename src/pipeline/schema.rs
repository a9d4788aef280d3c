//! Fixed record schema shared by the transcoder, the persisted stream and replay.
//!
//! Every channel slot of a raw frame maps positionally to one named field.

use crate::defaults::CHANNEL_SLOTS;
use std::ops::Range;

/// Number of fields in a labeled record (one per channel slot).
pub const FIELD_COUNT: usize = CHANNEL_SLOTS;

/// Number of primary EEG channels.
pub const PRIMARY_CHANNELS: usize = 16;

/// Field names in persisted column order.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "S", // sample index
    "C0", "C1", "C2", "C3", "C4", "C5", "C6", "C7", "C8", "C9", "C10", "C11", "C12", "C13",
    "C14", "C15", // primary channels
    "Ac0", "Ac1", "Ac2", // accelerometer
    "O1", "O2", "O3", "O4", "O5", "O6", "O7", // auxiliary
    "An0", "An1", "An2", // analog
    "Ts", // timestamp
    "O8", // trailing auxiliary
];

/// Field names of the reduced live view.
pub const REDUCED_FIELD_NAMES: [&str; PRIMARY_CHANNELS + 2] = [
    "S", "C0", "C1", "C2", "C3", "C4", "C5", "C6", "C7", "C8", "C9", "C10", "C11", "C12", "C13",
    "C14", "C15", "Ts",
];

pub const SAMPLE_INDEX: usize = 0;
pub const CHANNELS: Range<usize> = 1..17;
pub const ACCELEROMETER: Range<usize> = 17..20;
pub const AUXILIARY: Range<usize> = 20..27;
pub const ANALOG: Range<usize> = 27..30;
pub const TIMESTAMP: usize = 30;
pub const TRAILING_AUXILIARY: usize = 31;

/// Name of the timestamp column.
pub const TIMESTAMP_FIELD: &str = FIELD_NAMES[TIMESTAMP];

/// Name of the sample index column.
pub const SAMPLE_INDEX_FIELD: &str = FIELD_NAMES[SAMPLE_INDEX];

/// Auxiliary column spellings written by older recorders, with a zero in
/// place of the letter O.
pub const FIELD_ALIASES: [(&str, usize); 5] = [
    ("02", AUXILIARY.start + 1),
    ("03", AUXILIARY.start + 2),
    ("05", AUXILIARY.start + 4),
    ("06", AUXILIARY.start + 5),
    ("07", AUXILIARY.start + 6),
];

/// Returns the slot a field name (or one of its aliases) binds to.
pub fn slot_of(name: &str) -> Option<usize> {
    FIELD_NAMES
        .iter()
        .position(|field| *field == name)
        .or_else(|| {
            FIELD_ALIASES
                .iter()
                .find(|(alias, _)| *alias == name)
                .map(|(_, slot)| *slot)
        })
}
