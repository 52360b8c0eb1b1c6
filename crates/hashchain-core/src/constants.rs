use crate::Hash;

pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Difficulty counts leading hex digits, so it is bounded by the digest's hex width.
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const GENESIS_PREVIOUS_HASH: Hash = [0u8; HASH_SIZE];
pub const GENESIS_DATA: &[u8] = b"Genesis Block";
