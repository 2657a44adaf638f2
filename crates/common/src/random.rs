//! Random name tokens used by the rename strategies.

use rand::Rng;

use crate::constants::{RANDOM_NAME_EXT_LEN, RANDOM_NAME_STEM_LEN, RANDOM_SUFFIX_LEN};

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz012345";

/// Source of random tokens for rename strategies.
///
/// The rename engine only depends on this trait, so tests can plug in a
/// deterministic sequence.
pub trait TokenGenerator: Send + Sync {
    /// Produce an uppercase alphabetic token (`AddRandomLettersToEnd`).
    fn random_letters(&self) -> String;

    /// Produce a complete random folder name (`GenerateRandomName`).
    fn random_folder_name(&self) -> String;
}

/// Token generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngTokens;

impl ThreadRngTokens {
    fn pick(alphabet: &[u8], len: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..len)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect()
    }
}

impl TokenGenerator for ThreadRngTokens {
    fn random_letters(&self) -> String {
        Self::pick(UPPERCASE, RANDOM_SUFFIX_LEN)
    }

    /// Names look like `k2a0fq1c.x4d`, the same shape hosts use for temp names.
    fn random_folder_name(&self) -> String {
        format!(
            "{}.{}",
            Self::pick(NAME_ALPHABET, RANDOM_NAME_STEM_LEN),
            Self::pick(NAME_ALPHABET, RANDOM_NAME_EXT_LEN)
        )
    }
}
