//! Reading-time estimation

use super::ContentSection;

/// Words per minute assumed when estimating reading time
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 180;

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Words in every section heading and body
pub fn total_words(sections: &[ContentSection]) -> usize {
    sections
        .iter()
        .map(|s| count_words(&s.heading) + count_words(&s.body.as_text()))
        .sum()
}

/// Estimated minutes to read, rounded up
pub fn read_timing(sections: &[ContentSection], words_per_minute: u32) -> u32 {
    let words = total_words(sections) as u64;
    let wpm = u64::from(words_per_minute.max(1));
    words.div_ceil(wpm) as u32
}
