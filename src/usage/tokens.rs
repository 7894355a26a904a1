//! Heuristic token estimation.
//!
//! Latin-script text averages about four characters per token. CJK text
//! tokenizes far denser, so each CJK character is counted as one token.

use crate::orchestration::types::Message;

/// Characters per token for non-CJK text.
const CHARS_PER_TOKEN: u64 = 4;

/// Framing tokens added per message for role and separators.
const MESSAGE_OVERHEAD_TOKENS: u64 = 4;

pub struct TokenCounter;

impl TokenCounter {
    /// Estimate the token count of `text`.
    pub fn count_tokens(text: &str) -> u64 {
        let (cjk, other) = text.chars().fold((0u64, 0u64), |(cjk, other), c| {
            if is_cjk(c) {
                (cjk + 1, other)
            } else {
                (cjk, other + 1)
            }
        });

        cjk + other.div_ceil(CHARS_PER_TOKEN)
    }

    /// Estimate the prompt size of a message list, including per-message framing.
    pub fn count_messages_tokens(messages: &[Message]) -> u64 {
        messages
            .iter()
            .map(|m| Self::count_tokens(&m.content) + MESSAGE_OVERHEAD_TOKENS)
            .sum()
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF      // hiragana, katakana
        | 0x3400..=0x4DBF    // CJK extension A
        | 0x4E00..=0x9FFF    // CJK unified ideographs
        | 0xAC00..=0xD7AF    // hangul syllables
        | 0xF900..=0xFAFF    // CJK compatibility ideographs
        | 0xFF66..=0xFF9F    // halfwidth katakana
        | 0x20000..=0x2A6DF  // CJK extension B
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(TokenCounter::count_tokens(""), 0);
    }

    #[test]
    fn latin_text_uses_four_chars_per_token() {
        assert_eq!(TokenCounter::count_tokens("abcd"), 1);
        assert_eq!(TokenCounter::count_tokens("abcde"), 2);
        assert_eq!(TokenCounter::count_tokens("Hello, world!!!!"), 4);
    }

    #[test]
    fn cjk_counts_one_token_per_character() {
        assert_eq!(TokenCounter::count_tokens("你好世界"), 4);
        assert_eq!(TokenCounter::count_tokens("こんにちは"), 5);
        assert_eq!(TokenCounter::count_tokens("안녕"), 2);
    }

    #[test]
    fn mixed_text_sums_both_estimates() {
        // 2 CJK + 8 latin chars
        assert_eq!(TokenCounter::count_tokens("你好 hello!!"), 2 + 2);
    }

    #[test]
    fn cjk_is_denser_than_latin_of_same_length() {
        let latin = "abcdefghijkl";
        let cjk = "一二三四五六七八九十百千";
        assert_eq!(latin.chars().count(), cjk.chars().count());
        assert!(TokenCounter::count_tokens(cjk) > TokenCounter::count_tokens(latin));
    }

    #[test]
    fn messages_include_per_message_overhead() {
        let messages = vec![Message::system("abcd"), Message::user("abcdefgh")];
        assert_eq!(
            TokenCounter::count_messages_tokens(&messages),
            (1 + MESSAGE_OVERHEAD_TOKENS) + (2 + MESSAGE_OVERHEAD_TOKENS)
        );
    }

    #[test]
    fn no_messages_is_zero() {
        assert_eq!(TokenCounter::count_messages_tokens(&[]), 0);
    }
}
