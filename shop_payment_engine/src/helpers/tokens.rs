use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Bearer token plaintexts are exactly this long.
pub const TOKEN_LENGTH: usize = 26;

pub fn generate_token_plaintext() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(TOKEN_LENGTH).map(char::from).collect()
}

pub fn hash_token(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}
