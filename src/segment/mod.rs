//! Text segmentation over the learned dictionary.
//!
//! Two paths share one window size ([`MAX_WORD_CHARS`]):
//!
//! - [`Segmenter::segment`]: the learning path. Text is split into units;
//!   a unit is matched from the dictionary only if *every* word in it is
//!   known, otherwise the whole unit goes to the AI collaborator and each
//!   returned word is written back into the dictionary.
//! - [`Segmenter::annotate`]: the passive path. Longest known match per
//!   position, single characters with best-effort romanization where nothing
//!   matches. Never calls the AI and never writes the store.

pub mod ai;
pub mod romanize;

use serde::Serialize;

use crate::config::SegmenterConfig;
use crate::dictionary::{DictionaryEntry, DictionaryStore, Timestamp};
use crate::error::StoreError;

pub use ai::{create_ai_segmenter, AiError, AiSegmenter, OpenAiSegmenter, SegmentTriple};
pub use romanize::{Romanizer, StoreRomanizer};

/// Longest candidate word, in characters, tried at each position. AI words
/// longer than the window are still learned, but units holding them always
/// go back to the AI.
pub const MAX_WORD_CHARS: usize = 4;

/// Characters that end a unit. The terminator stays with its unit.
pub const UNIT_TERMINATORS: &[char] = &['。', '！', '？', '；', '!', '?', ';', '.', '\n'];

/// Rendered in place of a translation when the AI call for a unit failed.
pub const FAILED_TRANSLATION: &str = "[translation failed]";

/// Where a segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentSource {
    /// Matched a dictionary entry.
    Dictionary,
    /// Returned by the AI collaborator.
    Ai,
    /// Whole unit, emitted because the AI call failed.
    Fallback,
    /// Passive path: single character with no dictionary entry.
    Unknown,
    /// Punctuation or whitespace, never looked up.
    Passthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub word: String,
    pub romanization: String,
    /// `None` for passthrough, unknown and failed segments.
    pub translation: Option<String>,
    pub source: SegmentSource,
}

impl Segment {
    fn from_entry(entry: &DictionaryEntry) -> Self {
        Self {
            word: entry.word.clone(),
            romanization: entry.romanization.clone(),
            translation: Some(entry.primary_meaning().to_string()),
            source: SegmentSource::Dictionary,
        }
    }

    fn passthrough(text: String) -> Self {
        Self {
            word: text,
            romanization: String::new(),
            translation: None,
            source: SegmentSource::Passthrough,
        }
    }

    /// True for the degraded whole-unit segment emitted on AI failure.
    pub fn is_failed(&self) -> bool {
        self.source == SegmentSource::Fallback
    }

    /// Translation for display; failed segments show [`FAILED_TRANSLATION`].
    pub fn display_translation(&self) -> Option<&str> {
        if self.is_failed() {
            Some(FAILED_TRANSLATION)
        } else {
            self.translation.as_deref()
        }
    }
}

pub struct Segmenter {
    ai: Box<dyn AiSegmenter>,
    romanizer: Box<dyn Romanizer>,
    max_word_chars: usize,
    prompt_override: Option<String>,
}

impl Segmenter {
    pub fn new(ai: Box<dyn AiSegmenter>) -> Self {
        Self {
            ai,
            romanizer: Box::new(StoreRomanizer::default()),
            max_word_chars: MAX_WORD_CHARS,
            prompt_override: None,
        }
    }

    pub fn from_config(ai: Box<dyn AiSegmenter>, config: &SegmenterConfig) -> Self {
        let max_word_chars = config.max_word_chars.max(1);
        Self {
            ai,
            romanizer: Box::new(StoreRomanizer::new(max_word_chars)),
            max_word_chars,
            prompt_override: config.prompt_override.clone(),
        }
    }

    pub fn with_romanizer(mut self, romanizer: Box<dyn Romanizer>) -> Self {
        self.romanizer = romanizer;
        self
    }

    pub fn max_word_chars(&self) -> usize {
        self.max_word_chars
    }

    /// Segment `text` unit by unit, learning new words along the way.
    ///
    /// Units are processed in order, one AI call at a time, so a later unit
    /// sees words learned from an earlier one. AI failures degrade to a
    /// fallback segment; only store persistence errors are returned.
    pub async fn segment(
        &self,
        store: &mut DictionaryStore,
        text: &str,
        now: Timestamp,
    ) -> Result<Vec<Segment>, StoreError> {
        let mut out = Vec::new();

        for unit in split_units(text) {
            match self.match_unit(store, unit) {
                Some(segments) => {
                    tracing::debug!(unit, words = segments.len(), "unit matched from dictionary");
                    let words: Vec<&str> = segments
                        .iter()
                        .filter(|s| s.source == SegmentSource::Dictionary)
                        .map(|s| s.word.as_str())
                        .collect();
                    if !words.is_empty() {
                        store.record_encounters(&words)?;
                    }
                    out.extend(segments);
                }
                None => {
                    tracing::debug!(unit, "unit has unknown words, asking AI");
                    out.extend(self.segment_with_ai(store, unit, now).await?);
                }
            }
        }

        Ok(out)
    }

    /// Dictionary-only segmentation of one unit: greedy longest match, all or
    /// nothing. Returns `None` as soon as a position matches no entry.
    pub fn match_unit(&self, store: &DictionaryStore, unit: &str) -> Option<Vec<Segment>> {
        let chars: Vec<char> = unit.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if is_passthrough(chars[i]) {
                let end = passthrough_run_end(&chars, i);
                segments.push(Segment::passthrough(chars[i..end].iter().collect()));
                i = end;
                continue;
            }
            let (len, entry) = longest_match(store, &chars, i, self.max_word_chars)?;
            segments.push(Segment::from_entry(entry));
            i += len;
        }

        Some(segments)
    }

    /// Annotate what the dictionary already knows. Read-only, never fails.
    pub fn annotate(&self, store: &DictionaryStore, text: &str) -> Vec<Segment> {
        let chars: Vec<char> = text.chars().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if is_passthrough(chars[i]) {
                let end = passthrough_run_end(&chars, i);
                segments.push(Segment::passthrough(chars[i..end].iter().collect()));
                i = end;
                continue;
            }
            match longest_match(store, &chars, i, self.max_word_chars) {
                Some((len, entry)) => {
                    segments.push(Segment::from_entry(entry));
                    i += len;
                }
                None => {
                    let word = chars[i].to_string();
                    segments.push(Segment {
                        romanization: self.romanizer.romanize(store, &word),
                        word,
                        translation: None,
                        source: SegmentSource::Unknown,
                    });
                    i += 1;
                }
            }
        }

        segments
    }

    async fn segment_with_ai(
        &self,
        store: &mut DictionaryStore,
        unit: &str,
        now: Timestamp,
    ) -> Result<Vec<Segment>, StoreError> {
        let triples = match self
            .ai
            .segment_unit(unit, self.prompt_override.as_deref())
            .await
        {
            Ok(triples) => triples,
            Err(e) => {
                tracing::warn!(unit, error = %e, "AI segmentation failed, using fallback");
                return Ok(vec![self.fallback(store, unit)]);
            }
        };

        let mut segments = Vec::with_capacity(triples.len());
        for triple in triples {
            let word = triple.word.trim();
            if word.is_empty() {
                continue;
            }
            if word.chars().all(is_passthrough) {
                segments.push(Segment::passthrough(word.to_string()));
                continue;
            }

            let romanization = triple.romanization.trim();
            let translation = triple.translation.trim();
            if !translation.is_empty() {
                if word.chars().count() > self.max_word_chars {
                    // Stored and exported, but never matched locally.
                    tracing::debug!(word, max = self.max_word_chars, "learned word exceeds match window");
                }
                store.upsert(word, romanization, translation, now)?;
            } else if store.contains(word) {
                store.record_encounters(&[word])?;
            }

            segments.push(Segment {
                word: word.to_string(),
                romanization: romanization.to_string(),
                translation: (!translation.is_empty()).then(|| translation.to_string()),
                source: SegmentSource::Ai,
            });
        }

        if segments.iter().all(|s| s.source == SegmentSource::Passthrough) {
            tracing::warn!(unit, "AI returned no usable words, using fallback");
            return Ok(vec![self.fallback(store, unit)]);
        }

        tracing::debug!(unit, words = segments.len(), "unit segmented by AI");
        Ok(segments)
    }

    fn fallback(&self, store: &DictionaryStore, unit: &str) -> Segment {
        Segment {
            word: unit.to_string(),
            romanization: self.romanizer.romanize(store, unit),
            translation: None,
            source: SegmentSource::Fallback,
        }
    }
}

/// Split `text` into trimmed, non-empty units ending at a terminator.
pub fn split_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut start = 0;

    for (idx, c) in text.char_indices() {
        if UNIT_TERMINATORS.contains(&c) {
            let end = idx + c.len_utf8();
            push_unit(&mut units, &text[start..end]);
            start = end;
        }
    }
    push_unit(&mut units, &text[start..]);

    units
}

fn push_unit<'a>(units: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        units.push(trimmed);
    }
}

/// Longest dictionary entry starting at `chars[start]`, at most `max_word_chars` long.
pub(crate) fn longest_match<'s>(
    store: &'s DictionaryStore,
    chars: &[char],
    start: usize,
    max_word_chars: usize,
) -> Option<(usize, &'s DictionaryEntry)> {
    longest_match_where(store, chars, start, max_word_chars, |_| true)
}

/// Like [`longest_match`], but only entries passing `accept` count; a
/// rejected span falls through to the next shorter one.
pub(crate) fn longest_match_where<'s>(
    store: &'s DictionaryStore,
    chars: &[char],
    start: usize,
    max_word_chars: usize,
    accept: impl Fn(&DictionaryEntry) -> bool,
) -> Option<(usize, &'s DictionaryEntry)> {
    let max = max_word_chars.min(chars.len().saturating_sub(start));
    (1..=max).rev().find_map(|len| {
        let candidate: String = chars[start..start + len].iter().collect();
        store
            .lookup(&candidate)
            .filter(|entry| accept(entry))
            .map(|entry| (len, entry))
    })
}

/// Punctuation and whitespace: carried through segmentation, never looked up.
pub fn is_passthrough(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || matches!(c,
            '\u{3000}'..='\u{303F}'   // CJK symbols and punctuation
            | '\u{FF01}'..='\u{FF0F}' // fullwidth ASCII punctuation
            | '\u{FF1A}'..='\u{FF20}'
            | '\u{FF3B}'..='\u{FF40}'
            | '\u{FF5B}'..='\u{FF65}'
            | '\u{2010}'..='\u{2027}' // dashes, quotes, ellipsis
            | '\u{00B7}'
        )
}

fn passthrough_run_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && is_passthrough(chars[end]) {
        end += 1;
    }
    end
}
