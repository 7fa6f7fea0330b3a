//! CLI `review` command: interactive flashcard session.

use anyhow::Result;

use glossa::config::GlossaConfig;
use glossa::dictionary::types::now_millis;
use glossa::review::{
    format_interval, preview_intervals, Quality, ReviewSession, SessionOrder, SessionState,
};

use super::prompt_line;

/// Run a review session over everything due. Enter reveals, 1/3/4/5 grades,
/// `q` quits. Every grade is saved as it happens.
pub fn review(config: &GlossaConfig, limit: Option<usize>, shuffle: bool) -> Result<()> {
    let mut store = super::open_store(config)?;

    let order = if shuffle || config.review.shuffle {
        SessionOrder::ShuffledBatch {
            seed: now_millis() as u64,
        }
    } else {
        SessionOrder::DueFirst
    };
    let batch_size = limit.unwrap_or(config.review.batch_size);
    let mut session = ReviewSession::start(&store, now_millis(), order, batch_size);

    if session.state() == SessionState::Empty {
        println!("Nothing due. {} words in dictionary.", store.len());
        return Ok(());
    }

    'cards: loop {
        let Some(entry) = session.current().map(|card| card.entry.clone()) else {
            break;
        };
        println!();
        println!("{}    ({} left)", entry.word, session.progress().remaining);

        match prompt_line("[Enter] reveal, q quit: ")? {
            Some(input) if input != "q" => {}
            _ => break 'cards,
        }
        session.reveal();

        if !entry.romanization.is_empty() {
            println!("  {}", entry.romanization);
        }
        for meaning in &entry.meanings {
            println!("  - {meaning}");
        }

        let current = store.lookup(&entry.word).map(|e| e.srs).unwrap_or(entry.srs);
        let buttons: Vec<String> = preview_intervals(&current)
            .iter()
            .map(|(q, days)| format!("{} {q} ({})", q.value(), format_interval(*days)))
            .collect();
        println!("  {}", buttons.join("   "));

        let quality = loop {
            let Some(input) = prompt_line("Grade: ")? else {
                break 'cards;
            };
            if input == "q" {
                break 'cards;
            }
            match input.parse::<u8>().ok().map(Quality::try_from) {
                Some(Ok(q)) => break q,
                Some(Err(e)) => println!("  {e}"),
                None => println!("  enter 1, 3, 4 or 5"),
            }
        };

        let next = session.grade(&mut store, quality, now_millis())?;
        println!("  next review in {}", format_interval(next.interval_days));
    }

    let progress = session.progress();
    println!();
    println!(
        "Reviewed {} cards ({} correct, {} again).",
        progress.reviewed, progress.correct_count, progress.again_count
    );
    if session.state() == SessionState::Complete {
        println!("All caught up.");
    }

    Ok(())
}
