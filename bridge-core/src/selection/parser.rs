//! Free-form text to option number.

/// Spelled-out numbers accepted by [`parse_number`].
///
/// The table is closed: words outside it ("eleven", "twenty") are rejected
/// even though they name numbers.
pub const NUMBER_WORDS: [(&str, usize); 10] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

/// Parse a user's reply into a number.
///
/// Surrounding whitespace is ignored. The reply is tried as a run of ASCII
/// digits first (leading zeros allowed, `"07"` is 7), then as a
/// case-insensitive entry of [`NUMBER_WORDS`]. A digit run too large for
/// `usize` saturates to `usize::MAX`, so it is still a number and resolves as
/// out of range. Anything else, such as decimals, signs or embedded spaces,
/// returns `None`.
pub fn parse_number(text: &str) -> Option<usize> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Some(trimmed.parse::<usize>().unwrap_or(usize::MAX));
    }

    NUMBER_WORDS
        .iter()
        .find(|(word, _)| word.eq_ignore_ascii_case(trimmed))
        .map(|&(_, value)| value)
}
