//! Command Module
//!
//! Splits command strings into bangs and hands them to a
//! [`CommandDispatcher`]. Dispatchers never touch the skin collection; they
//! emit [`Action`]s that the orchestrator queues and applies once the current
//! operation has finished.

mod builtin;
#[cfg(test)]
mod tests;

pub use builtin::BuiltinCommands;

use std::path::PathBuf;

use crate::skin::SkinId;

/// Skin addressed by an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkinTarget {
    /// A live window
    Id(SkinId),
    /// A skin path, resolved against the skins directory
    Path(PathBuf),
}

/// Deferred request against the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Activate the skin at a path
    Activate(PathBuf),
    /// Ask a window to deactivate itself
    Deactivate(SkinTarget),
    /// Deactivate if active, activate otherwise
    Toggle(PathBuf),
    /// Self-removal of a window that finished deactivating
    Remove(SkinId),
    /// Refresh one window, or every window when `None`
    Refresh(Option<SkinTarget>),
    /// Reload the current layout from scratch
    RefreshApp,
    /// Switch layout; `None` reloads the current one
    LoadLayout(Option<PathBuf>),
    /// Clear counters and stamp a new reset label
    ResetStats,
    /// Forced statistics write
    WriteStats,
    /// Run a command string, optionally scoped to one window
    Execute {
        command: String,
        scope: Option<SkinId>,
    },
}

/// External command semantics
pub trait CommandDispatcher: Send {
    /// Execute one bang. Returns `false` when the bang is not understood.
    fn execute_bang(
        &mut self,
        bang: &str,
        args: &[String],
        scope: Option<SkinId>,
        actions: &mut Vec<Action>,
    ) -> bool;
}

/// One parsed bang with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bang {
    pub name: String,
    pub args: Vec<String>,
}

/// Split a command string into bangs.
///
/// `[!A x][!B "y z"]` yields two bangs; anything outside top-level brackets
/// is ignored in that form. A string that does not start with `[` is a
/// single bang. Text that does not start with `!` is skipped with a warning.
pub fn parse_command(command: &str) -> Vec<Bang> {
    let command = command.trim();
    if command.starts_with('[') {
        split_brackets(command)
            .into_iter()
            .filter_map(parse_bang)
            .collect()
    } else {
        parse_bang(command).into_iter().collect()
    }
}

fn split_brackets(command: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_quotes = false;

    for (i, c) in command.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ']' if !in_quotes && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    parts.push(&command[start..i]);
                }
            }
            _ => {}
        }
    }

    if depth != 0 {
        tracing::warn!(command, "Unbalanced brackets in command");
    }
    parts
}

fn parse_bang(text: &str) -> Option<Bang> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if !text.starts_with('!') {
        tracing::warn!(command = text, "Not a bang, ignored");
        return None;
    }

    let mut tokens = tokenize(text).into_iter();
    let name = tokens.next()?;
    Some(Bang {
        name,
        args: tokens.collect(),
    })
}

/// Whitespace-separated tokens; double quotes group and are stripped
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}
