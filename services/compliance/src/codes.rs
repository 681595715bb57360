//! Random codes for wallet challenges and referral links

use rand::distributions::Uniform;
use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of wallet verification and referral codes
pub const CODE_LENGTH: usize = 8;

/// Uppercase alphanumeric code of `len` characters
pub fn random_code_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let dist = Uniform::from(0..ALPHABET.len());
    (0..len)
        .map(|_| char::from(ALPHABET[rng.sample(dist)]))
        .collect()
}

pub fn random_code() -> String {
    random_code_with(&mut rand::thread_rng(), CODE_LENGTH)
}
