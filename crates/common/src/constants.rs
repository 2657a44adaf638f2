//! Shared constants used across rusty-dirmanager crates.

/// Characters a folder name may never contain.
pub const RESERVED_NAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Separator used by the default rename strategy.
pub const DEFAULT_SEPARATOR: char = '-';

/// First counter value used by the default rename strategy.
pub const DEFAULT_START_FROM: i64 = 1;

/// Length of the uppercase token appended by `AddRandomLettersToEnd`.
pub const RANDOM_SUFFIX_LEN: usize = 4;

/// Length of the stem of a generated random folder name (`xxxxxxxx.xxx`).
pub const RANDOM_NAME_STEM_LEN: usize = 8;

/// Length of the extension of a generated random folder name (`xxxxxxxx.xxx`).
pub const RANDOM_NAME_EXT_LEN: usize = 3;
