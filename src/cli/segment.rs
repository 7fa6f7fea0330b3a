//! CLI `segment` and `annotate` commands.

use anyhow::Result;

use glossa::config::GlossaConfig;
use glossa::dictionary::types::now_millis;
use glossa::segment::{create_ai_segmenter, Segment, SegmentSource, Segmenter};

/// Segment text, asking the AI about units with unknown words and learning
/// what it returns. With `offline`, falls back to the read-only annotate path.
pub async fn segment(config: &GlossaConfig, text: &str, offline: bool, json: bool) -> Result<()> {
    let mut store = super::open_store(config)?;
    let segmenter = Segmenter::from_config(create_ai_segmenter(&config.ai)?, &config.segmenter);

    let before = store.len();
    let segments = if offline {
        segmenter.annotate(&store, text)
    } else {
        segmenter.segment(&mut store, text, now_millis()).await?
    };

    print_segments(&segments, json)?;

    let learned = store.len().saturating_sub(before);
    if learned > 0 {
        eprintln!("Learned {learned} new words.");
    }
    Ok(())
}

/// Annotate text from the dictionary alone. Never calls the AI.
pub fn annotate(config: &GlossaConfig, text: &str, json: bool) -> Result<()> {
    let store = super::open_store(config)?;
    let segmenter = Segmenter::from_config(create_ai_segmenter(&config.ai)?, &config.segmenter);

    print_segments(&segmenter.annotate(&store, text), json)
}

fn print_segments(segments: &[Segment], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(segments)?);
        return Ok(());
    }

    let width = segments
        .iter()
        .filter(|s| s.source != SegmentSource::Passthrough)
        .map(|s| s.word.chars().count())
        .max()
        .unwrap_or(0);

    for seg in segments {
        if seg.source == SegmentSource::Passthrough {
            if seg.word.contains('\n') {
                println!();
            }
            continue;
        }
        // CJK glyphs are double width in most terminals
        let pad = " ".repeat((width - seg.word.chars().count()) * 2);
        println!(
            "  {}{pad}  {:<20}  {}",
            seg.word,
            seg.romanization,
            seg.display_translation().unwrap_or("-")
        );
    }
    Ok(())
}
