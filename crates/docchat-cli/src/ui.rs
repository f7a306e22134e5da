//! Terminal UI helpers

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use docchat_core::{ChatMessage, Error, IngestionReport, Result, Role, ScoredRecord};

/// Which interactive mode is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Chat,
    Documents,
}

/// Display startup banner
pub fn display_banner(mode: Mode, model_id: &str) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = 60.min(terminal_width.saturating_sub(4)).max(40);
    let inner = banner_width - 2;

    let top_border = format!("┌{}┐", "─".repeat(inner));
    let bottom_border = format!("└{}┘", "─".repeat(inner));
    let empty_line = format!("│{}│", " ".repeat(inner));

    let title = match mode {
        Mode::Chat => "docchat - chat",
        Mode::Documents => "docchat - chat with your documents",
    };
    let model_line = format!("model: {}", model_id);

    println!();
    println!("{}", top_border.blue());
    println!("{}", empty_line.blue());
    for (line, bold) in [(title, true), (model_line.as_str(), false)] {
        let padding = inner.saturating_sub(line.chars().count() + 2);
        let text = if bold { line.bold() } else { line.dimmed() };
        println!("{}  {}{}{}", "│".blue(), text, " ".repeat(padding), "│".blue());
    }
    println!("{}", empty_line.blue());
    println!("{}", bottom_border.blue());
    println!();
    println!("{}", "Type /help for commands, /exit to quit".dimmed());
    println!();
}

fn redraw(prompt: &str, input: &[char], previous_len: usize) -> Result<()> {
    let line: String = input.iter().collect();
    let clear = previous_len.saturating_sub(input.len());
    print!(
        "\r{} {}{}\r{} {}",
        prompt.green().bold(),
        line,
        " ".repeat(clear),
        prompt.green().bold(),
        line
    );
    io::stdout().flush()?;
    Ok(())
}

/// Read one line with ↑/↓ history navigation.
///
/// Returns `None` on end of input or Ctrl-C / Ctrl-D.
pub fn read_line_with_history(prompt: &str, history: &mut Vec<String>) -> Result<Option<String>> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(Some(input));
    }

    print!("{} ", prompt.green().bold());
    io::stdout().flush()?;

    enable_raw_mode()?;
    let result = read_raw_line(prompt, history);
    disable_raw_mode()?;
    println!();

    let line = result?;
    if let Some(input) = &line {
        if !input.is_empty() {
            history.push(input.clone());
        }
    }
    Ok(line)
}

fn read_raw_line(prompt: &str, history: &[String]) -> Result<Option<String>> {
    let mut input: Vec<char> = Vec::new();
    let mut history_index: Option<usize> = None;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }
        let previous_len = input.len();

        match key_event.code {
            KeyCode::Enter => {
                return Ok(Some(input.iter().collect::<String>().trim().to_string()));
            }
            KeyCode::Char('c' | 'd') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(None);
            }
            KeyCode::Char(c) => {
                input.push(c);
                redraw(prompt, &input, previous_len)?;
            }
            KeyCode::Backspace => {
                if input.pop().is_some() {
                    redraw(prompt, &input, previous_len)?;
                }
            }
            KeyCode::Up if !history.is_empty() => {
                let index = match history_index {
                    None => history.len() - 1,
                    Some(index) => index.saturating_sub(1),
                };
                history_index = Some(index);
                input = history[index].chars().collect();
                redraw(prompt, &input, previous_len)?;
            }
            KeyCode::Down => {
                if let Some(index) = history_index {
                    if index + 1 < history.len() {
                        history_index = Some(index + 1);
                        input = history[index + 1].chars().collect();
                    } else {
                        history_index = None;
                        input.clear();
                    }
                    redraw(prompt, &input, previous_len)?;
                }
            }
            KeyCode::Esc => {
                input.clear();
                history_index = None;
                redraw(prompt, &input, previous_len)?;
            }
            _ => {}
        }
    }
}

/// Display help message
pub fn print_help(mode: Mode) {
    println!("{}", "Available commands:".bold());
    match mode {
        Mode::Chat => {
            println!("  {} - Send a message to the model", "<message>".green());
        }
        Mode::Documents => {
            println!(
                "  {} - Ask a question about the uploaded documents",
                "<question>".green()
            );
            println!(
                "  {} - Index more files (resets the conversation)",
                "/upload <path>...".green()
            );
            println!("  {} - Show the vector store statistics", "/stats".green());
        }
    }
    println!("  {} - Show the conversation so far", "/history".green());
    println!("  {} - Show this help message", "/help".green());
    println!("  {} - Exit the application", "/exit".green());
}

/// Show the turns of a conversation
pub fn print_history(turns: &[ChatMessage]) {
    if turns.is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return;
    }
    for turn in turns {
        let label = match turn.role {
            Role::User => "you".cyan().bold(),
            Role::Assistant => "assistant".green().bold(),
            Role::System => "system".dimmed(),
        };
        println!("{} {}", label, turn.content);
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}…", &flat[..byte_index]),
        None => flat,
    }
}

/// Show retrieved passages with their scores and sources
pub fn print_passages(passages: &[ScoredRecord]) {
    if passages.is_empty() {
        println!("{}", "No matching passages.".dimmed());
        return;
    }
    for (rank, passage) in passages.iter().enumerate() {
        let source = passage
            .metadata
            .get("source")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");
        println!(
            "{} {} {}",
            format!("[{}]", rank + 1).yellow(),
            format!("{:.3}", passage.score).dimmed(),
            source.cyan()
        );
        println!("    {}", preview(&passage.text, 160));
    }
}

/// Show which documents were indexed
pub fn print_ingestion(reports: &[IngestionReport]) {
    for report in reports {
        println!(
            "{} {} ({} chunks, {})",
            "indexed".green(),
            report.source,
            report.chunks_stored,
            report.encoding
        );
    }
}

pub fn print_error(error: &impl std::fmt::Display) {
    eprintln!("{} {}", "error:".red().bold(), error);
}

/// Advice shown under a failure that may succeed when retried
pub fn failure_hint(error: &Error) -> Option<&'static str> {
    error
        .is_transient()
        .then_some("This looks temporary; nothing was saved, so it is safe to retry.")
}

/// Print a failure and, when retrying could help, say so
pub fn print_failure(error: &Error) {
    print_error(error);
    if let Some(hint) = failure_hint(error) {
        eprintln!("{}", hint.dimmed());
    }
}
