//! Smallsh Parser
//!
//! Lines go through two stages: [`tokenize`] splits an expanded line into
//! words and strips the background marker, and [`Command::parse`] turns the
//! words into a [`Command`], pulling out redirections.

use crate::errors::{Error, Result};

pub use self::ast::{Command, Tokens};

pub mod ast;

const BACKGROUND_MARKER: char = '&';
const COMMENT: &str = "#";
const REDIRECT_INPUT: &str = "<";
const REDIRECT_OUTPUT: &str = ">";

/// Splits `line` on whitespace.
///
/// A `&` as the very last character of the line requests background
/// execution. The marker is always removed; the request is only honored when
/// `foreground_only` is unset.
pub fn tokenize(line: &str, foreground_only: bool) -> Tokens {
    let (line, marked) = match line.strip_suffix(BACKGROUND_MARKER) {
        Some(rest) => (rest, true),
        None => (line, false),
    };

    if marked && foreground_only {
        debug!("foreground-only mode: ignoring background marker");
    }

    Tokens {
        words: line.split_whitespace().map(str::to_string).collect(),
        background: marked && !foreground_only,
    }
}

impl Command {
    /// Builds a command from `tokens`.
    ///
    /// Returns `Ok(None)` for blank and comment lines. `<` and `>` may appear
    /// anywhere; each takes the following word as its file and the last one
    /// of each direction wins.
    pub fn parse(tokens: Tokens) -> Result<Option<Command>> {
        let Tokens { words, background } = tokens;
        match words.first() {
            None => return Ok(None),
            Some(first) if first == COMMENT => return Ok(None),
            _ => {}
        }

        let mut argv = Vec::with_capacity(words.len());
        let mut stdin = None;
        let mut stdout = None;
        let mut words = words.into_iter();
        while let Some(word) = words.next() {
            let target = match word.as_str() {
                REDIRECT_INPUT => &mut stdin,
                REDIRECT_OUTPUT => &mut stdout,
                _ => {
                    argv.push(word);
                    continue;
                }
            };

            match words.next() {
                Some(path) => *target = Some(path),
                None => return Err(Error::syntax(format!("{} requires a file name", word))),
            }
        }

        if argv.is_empty() {
            return Err(Error::syntax("redirection without a command"));
        }

        let command = Command {
            argv,
            stdin,
            stdout,
            background,
        };
        debug!("parsed Command: {:?}", command);
        Ok(Some(command))
    }
}
