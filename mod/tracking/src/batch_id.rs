//! Batch identifier generation.
//!
//! A batch id reads `AAA-BBB-YYMMDD-XXXX`: uppercase prefixes of the
//! company and product names, the registration date, and a random
//! 4-character token over A–Z and 0–9 (36^4 combinations per
//! company/product/day). Uniqueness is best-effort; the registry treats a
//! collision as a recoverable condition and regenerates.

use rand::Rng;

const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const TOKEN_LEN: usize = 4;
const PREFIX_LEN: usize = 3;

/// Generate a batch identifier from the registration inputs.
pub fn generate(company: &str, product_name: &str) -> String {
    let date = chrono::Local::now().format("%y%m%d");
    format!(
        "{}-{}-{}-{}",
        prefix(company),
        prefix(product_name),
        date,
        random_token()
    )
}

/// Uppercase prefix of up to three characters.
fn prefix(s: &str) -> String {
    s.chars().take(PREFIX_LEN).collect::<String>().to_uppercase()
}

fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}
