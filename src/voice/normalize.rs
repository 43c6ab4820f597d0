//! Transcript cleanup shared by command matching, interim previews, and remote fallback.

const TRAILING_PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':'];

/// Lower-case, collapse whitespace/control characters, and drop the sentence
/// punctuation engines append ("Scroll down." -> "scroll down").
#[must_use]
pub fn normalize_transcript(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut last_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() || ch.is_control() {
            if !last_space {
                collapsed.push(' ');
                last_space = true;
            }
        } else {
            collapsed.extend(ch.to_lowercase());
            last_space = false;
        }
    }
    collapsed
        .trim()
        .trim_matches(TRAILING_PUNCTUATION)
        .trim()
        .to_string()
}

/// Single-line, length-capped preview for interim feedback.
#[must_use]
pub fn format_transcript_preview(text: &str, max_len: usize) -> String {
    let cleaned: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let max_len = max_len.max(4);
    if cleaned.chars().count() > max_len {
        let keep = max_len.saturating_sub(3);
        let prefix: String = cleaned.chars().take(keep).collect();
        format!("{prefix}...")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_lowercases_and_strips_engine_punctuation() {
        assert_eq!(normalize_transcript("  Scroll   Down. "), "scroll down");
        assert_eq!(normalize_transcript("Click\tthe\nbutton Submit!"), "click the button submit");
        assert_eq!(normalize_transcript("what's next?"), "what's next");
    }

    #[test]
    fn normalize_keeps_digits_and_inner_punctuation() {
        assert_eq!(normalize_transcript("Scroll down 500."), "scroll down 500");
        assert_eq!(normalize_transcript("type a.b@c.d in email"), "type a.b@c.d in email");
    }

    #[test]
    fn normalize_empty_and_punctuation_only_yield_empty() {
        assert!(normalize_transcript(" \n\t ").is_empty());
        assert!(normalize_transcript(" ... ").is_empty());
    }

    #[test]
    fn preview_collapses_and_truncates() {
        assert_eq!(format_transcript_preview("  hello\t\nworld  ", 32), "hello world");
        assert_eq!(format_transcript_preview("alpha beta gamma", 8), "alpha...");
        assert_eq!(format_transcript_preview("abcdef", 2), "a...");
    }
}
