//! Line-oriented terminal front-end.
//!
//! Each input line is either a `:command` or a sentence to classify. The
//! history table is printed on start and again on `:history` / `:refresh`.

use std::io::{BufRead, Write};

use anyhow::{anyhow, Context, Result};

use crate::{
    commands::{get_history, submit_text, SubmitOutcome},
    db::DEFAULT_HISTORY_LIMIT,
    AppState,
};

pub mod render;

const ENABLE_LOGS: bool = true;

const PROMPT: &str = "> ";
const PLACEHOLDER: &str = "e.g. Hôm nay tôi rất vui";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action<'a> {
    Submit(&'a str),
    ShowHistory,
    Help,
    Quit,
}

fn parse_action(line: &str) -> Action<'_> {
    match line.trim() {
        ":q" | ":quit" | ":exit" => Action::Quit,
        ":history" | ":refresh" => Action::ShowHistory,
        ":help" | ":h" => Action::Help,
        _ => Action::Submit(line),
    }
}

/// Drive one interactive session until `:quit` or end of input.
///
/// Storage failures end the session with an error; everything the classifier
/// reports is rendered and the session continues.
pub fn run_session<R, W>(state: &AppState<'_>, input: R, out: &mut W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(
        out,
        "Type a Vietnamese sentence ({PLACEHOLDER}) and press Enter. `:help` lists commands."
    )?;
    show_history(state, out)?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("failed to read input")?;

        match parse_action(&line) {
            Action::Quit => break,
            Action::Help => print_help(out)?,
            Action::ShowHistory => show_history(state, out)?,
            Action::Submit(text) => {
                if !text.is_empty() {
                    render::busy(out)?;
                }
                let outcome = submit_text(state, text).map_err(|e| anyhow!(e))?;
                if let SubmitOutcome::Rejected { message } = &outcome {
                    crate::log_debug!("Submission rejected: {message}");
                }
                render::outcome(out, &outcome)?;
            }
        }
    }

    crate::log_info!("Session ended");
    Ok(())
}

fn show_history<W: Write>(state: &AppState<'_>, out: &mut W) -> Result<()> {
    let entries = get_history(state, DEFAULT_HISTORY_LIMIT).map_err(|e| anyhow!(e))?;
    render::history(out, &entries)?;
    Ok(())
}

fn print_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "  <sentence>   classify and save")?;
    writeln!(out, "  :history     show the {DEFAULT_HISTORY_LIMIT} most recent results (alias :refresh)")?;
    writeln!(out, "  :quit        leave")?;
    Ok(())
}
