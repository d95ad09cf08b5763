//! Reading-time estimates for rendered post content.
//!
//! Word counting ignores markup: tags are dropped and character entities are
//! treated as separators, so `<p>Hola &amp; mundo</p>` counts two words.
//! Minutes are rounded up, while the millisecond duration is derived from the
//! exact ratio and only rounded at the end.

use std::num::NonZeroU32;

use serde::Serialize;

use crate::text::{collapse_whitespace, replace_entities, strip_tags};

pub const DEFAULT_WORDS_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(225) {
    Some(rate) => rate,
    None => panic!("default reading rate must be non-zero"),
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingTime {
    pub words: u64,
    pub minutes: u64,
    pub text: String,
    /// Duration in milliseconds, e.g. for schema.org `timeRequired`.
    pub time_ms: u64,
}

pub fn reading_time(content: &str) -> ReadingTime {
    reading_time_with_rate(content, DEFAULT_WORDS_PER_MINUTE)
}

pub fn reading_time_with_rate(content: &str, words_per_minute: NonZeroU32) -> ReadingTime {
    let words = count_words(content);
    let rate = u64::from(words_per_minute.get());
    let minutes = words.div_ceil(rate);
    let time_ms = (words as f64 / rate as f64 * 60_000.0).round() as u64;
    ReadingTime {
        words,
        minutes,
        text: reading_label(minutes),
        time_ms,
    }
}

/// Aggregate estimate over several documents. The contents are joined with a
/// single space and counted in one pass.
pub fn total_reading_time(contents: &[&str], words_per_minute: NonZeroU32) -> ReadingTime {
    reading_time_with_rate(&contents.join(" "), words_per_minute)
}

pub fn count_words(content: &str) -> u64 {
    let without_tags = strip_tags(content);
    let clean = collapse_whitespace(&replace_entities(&without_tags, " "));
    clean.split_whitespace().count() as u64
}

pub fn reading_label(minutes: u64) -> String {
    if minutes == 1 {
        return "1 min de lectura".to_string();
    }
    if minutes < 60 {
        return format!("{minutes} min de lectura");
    }
    let hours = minutes / 60;
    let remaining = minutes % 60;
    if remaining == 0 {
        format!("{hours}h de lectura")
    } else {
        format!("{hours}h {remaining}min de lectura")
    }
}

pub fn format_word_count(words: u64) -> String {
    if words < 1_000 {
        return format!("{words} palabras");
    }
    if words < 1_000_000 {
        let tenths = (words as f64 / 100.0).round() as u64;
        return format!("{}k palabras", format_tenths(tenths));
    }
    let tenths = (words as f64 / 100_000.0).round() as u64;
    format!("{}M palabras", format_tenths(tenths))
}

fn format_tenths(tenths: u64) -> String {
    if tenths % 10 == 0 {
        format!("{}", tenths / 10)
    } else {
        format!("{}.{}", tenths / 10, tenths % 10)
    }
}
