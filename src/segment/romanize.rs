//! Best-effort romanization for text the dictionary cannot fully resolve.

use crate::dictionary::DictionaryStore;

/// Produces a phonetic rendering of arbitrary text. Output is best effort:
/// unknown characters may come back unchanged.
pub trait Romanizer: Send + Sync {
    fn romanize(&self, store: &DictionaryStore, text: &str) -> String;
}

/// Builds romanization from what the dictionary already knows: longest known
/// span first at each position, unknown characters left as they are,
/// syllable groups joined by spaces.
#[derive(Debug, Clone)]
pub struct StoreRomanizer {
    max_word_chars: usize,
}

impl StoreRomanizer {
    pub fn new(max_word_chars: usize) -> Self {
        Self {
            max_word_chars: max_word_chars.max(1),
        }
    }
}

impl Default for StoreRomanizer {
    fn default() -> Self {
        Self::new(super::MAX_WORD_CHARS)
    }
}

impl Romanizer for StoreRomanizer {
    fn romanize(&self, store: &DictionaryStore, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut parts: Vec<String> = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if chars[i].is_whitespace() {
                i += 1;
                continue;
            }
            let known = super::longest_match_where(store, &chars, i, self.max_word_chars, |entry| {
                !entry.romanization.is_empty()
            });
            match known {
                Some((len, entry)) => {
                    parts.push(entry.romanization.clone());
                    i += len;
                }
                None => {
                    parts.push(chars[i].to_string());
                    i += 1;
                }
            }
        }

        parts.join(" ")
    }
}
