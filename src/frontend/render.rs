use std::io::{self, Write};

use colored::Colorize;

use crate::{commands::SubmitOutcome, db::HistoryEntry, models::SentimentLabel};

pub const EMPTY_INPUT_WARNING: &str = "Please enter some content.";
pub const EMPTY_HISTORY_NOTICE: &str = "No history yet.";
pub const SAVED_NOTICE: &str = "Saved to history.";

const TEXT_COLUMN_MAX: usize = 48;
const TIME_HEADER: &str = "Time";
const TEXT_HEADER: &str = "Text";
const SENTIMENT_HEADER: &str = "Sentiment";

pub fn busy(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "Analyzing...".dimmed())?;
    out.flush()
}

pub fn outcome(out: &mut impl Write, outcome: &SubmitOutcome) -> io::Result<()> {
    match outcome {
        SubmitOutcome::EmptyInput => {
            writeln!(out, "{}", format!("! {EMPTY_INPUT_WARNING}").yellow())
        }
        SubmitOutcome::Rejected { message } => {
            writeln!(out, "{}", format!("⚠ {message}").red().bold())?;
            writeln!(out, "{}", format!("✖ {message}").dimmed())
        }
        SubmitOutcome::Saved { record, score } => {
            let banner = result_banner(record.sentiment, *score);
            let styled = match record.sentiment {
                SentimentLabel::Positive => banner.green().bold(),
                SentimentLabel::Negative => banner.red().bold(),
                SentimentLabel::Neutral | SentimentLabel::Unknown => banner.blue().bold(),
            };
            writeln!(out, "{styled}")?;
            writeln!(out, "{}", format!("✔ {SAVED_NOTICE}").dimmed())
        }
    }
}

pub fn result_banner(sentiment: SentimentLabel, score: f32) -> String {
    format!("Result: {sentiment} (confidence: {:.2}%)", score * 100.0)
}

pub fn history(out: &mut impl Write, entries: &[HistoryEntry]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "{}", EMPTY_HISTORY_NOTICE.blue());
    }

    let time_width = entries
        .iter()
        .map(|e| e.timestamp.chars().count())
        .chain([TIME_HEADER.len()])
        .max()
        .unwrap_or(TIME_HEADER.len());
    let text_width = entries
        .iter()
        .map(|e| e.text.chars().count().min(TEXT_COLUMN_MAX))
        .chain([TEXT_HEADER.len()])
        .max()
        .unwrap_or(TEXT_HEADER.len());

    let header = format!(
        "{} | {} | {}",
        pad(TIME_HEADER, time_width),
        pad(TEXT_HEADER, text_width),
        SENTIMENT_HEADER
    );
    writeln!(out, "{}", header.bold())?;
    writeln!(
        out,
        "{}",
        "-".repeat(time_width + text_width + SENTIMENT_HEADER.len() + 6)
    )?;

    for entry in entries {
        let text = truncate_chars(&entry.text, TEXT_COLUMN_MAX);
        writeln!(
            out,
            "{} | {} | {}",
            pad(&entry.timestamp, time_width),
            pad(&text, text_width),
            entry.sentiment
        )?;
    }

    Ok(())
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    let mut padded = value.to_string();
    padded.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    padded
}

fn truncate_chars(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut shortened: String = value.chars().take(max.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}
