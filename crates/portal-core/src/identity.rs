//! Submission identity generation.

use sha2::{Digest, Sha256};

use crate::models::{SubmissionToken, TOKEN_LEN};

/// Generate a fresh submission token.
///
/// 32 bytes from the thread-local CSPRNG are hashed and the first 128 bits of
/// the digest are hex encoded. No uniqueness check is made against earlier
/// tokens; collisions are bounded by the entropy alone.
pub fn new_token() -> SubmissionToken {
    let seed: [u8; 32] = rand::random();
    let digest = Sha256::digest(seed);
    SubmissionToken::from_hex(hex::encode(&digest[..TOKEN_LEN / 2]))
}
