//! Tokenizer for long-term learning.

/// Split `input` on whitespace, lowercase each piece, and keep the pieces
/// longer than `min_len` characters.
///
/// Punctuation is part of the token: `"please?"` stays `"please?"`.
pub fn extract_tokens(input: &str, min_len: usize) -> impl Iterator<Item = String> + '_ {
    input
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(move |token| token.chars().count() > min_len)
}
