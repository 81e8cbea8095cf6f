//! Human-readable batch codes.
//!
//! A batch code has the form `<Prefix>-<Sequence>-<DDMMYYYY>`, e.g.
//! `ArrPreBl-1-15122025` for the first batch of "Arroz Premium Blanco"
//! received on 15 December 2025. Codes are unique per product, not globally.

use chrono::NaiveDate;

/// Prefix used when the title has no usable letters.
pub const FALLBACK_PREFIX: &str = "PROD";

const MAX_WORDS: usize = 3;
const CHARS_PER_WORD: usize = 3;
const MAX_PREFIX_LEN: usize = 8;

/// Derive the code prefix from a product title.
///
/// Each of the first three words contributes its first three characters with
/// anything but ASCII letters dropped, capitalized. The result is capped at
/// eight characters.
///
/// ```rust
/// # use batchwise_core::batch_code_prefix;
/// assert_eq!(batch_code_prefix("Arroz Premium Blanco"), "ArrPreBl");
/// assert_eq!(batch_code_prefix("Azúcar"), "Az");
/// assert_eq!(batch_code_prefix("123 %%"), "PROD");
/// ```
#[must_use]
pub fn batch_code_prefix(title: &str) -> String {
    let prefix: String = title
        .split_whitespace()
        .take(MAX_WORDS)
        .map(word_fragment)
        .collect::<String>()
        .chars()
        .take(MAX_PREFIX_LEN)
        .collect();

    if prefix.is_empty() {
        FALLBACK_PREFIX.to_owned()
    } else {
        prefix
    }
}

fn word_fragment(word: &str) -> String {
    word.chars()
        .take(CHARS_PER_WORD)
        .filter(char::is_ascii_alphabetic)
        .enumerate()
        .map(|(i, c)| {
            if i == 0 {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

/// Generate the code for a new batch.
///
/// `existing_batches` is the number of batches already created for the
/// product; the new batch gets sequence `existing_batches + 1`.
///
/// ```rust
/// # use batchwise_core::generate_batch_code;
/// # use chrono::NaiveDate;
/// let date = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
/// assert_eq!(generate_batch_code("Azúcar", 0, date), "Az-1-15122025");
/// ```
#[must_use]
pub fn generate_batch_code(title: &str, existing_batches: i32, date: NaiveDate) -> String {
    format!(
        "{}-{}-{}",
        batch_code_prefix(title),
        existing_batches.saturating_add(1),
        date.format("%d%m%Y")
    )
}
