//! Marker pairs and the locator that finds the span between them.

use crate::AppError;
use regex::Regex;
use std::fmt;
use std::ops::Range;

/// Ordered pair of literal tokens delimiting one editable slot.
#[derive(Debug, Clone)]
pub struct MarkerPair {
    name: String,
    start: String,
    end: String,
    pattern: Regex,
}

/// Location of a matched slot inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Byte range of the whole match, both tokens included.
    pub full: Range<usize>,
    /// Byte range of the content between the tokens.
    pub inner: Range<usize>,
}

impl MarkerPair {
    /// Marker pair for a named slot: `/* NAME_START */` .. `/* NAME_END */`.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidValue`] if `name` is empty or is not a plain
    /// identifier.
    pub fn named(name: &str) -> Result<Self, AppError> {
        let valid = !name.is_empty() && name.chars().all(is_word_char);
        if !valid {
            return Err(AppError::InvalidValue(format!(
                "slot name '{}' must be a non-empty identifier",
                name
            )));
        }
        Self::with_tokens(
            name,
            &format!("/* {}_START */", name),
            &format!("/* {}_END */", name),
        )
    }

    /// Marker pair with explicit start and end tokens.
    ///
    /// # Arguments
    /// - `name`: Human-readable slot name used in logs and errors.
    /// - `start`: Canonical start token, written back verbatim on render.
    /// - `end`: Canonical end token, written back verbatim on render.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidValue`] when either token is blank.
    pub fn with_tokens(name: &str, start: &str, end: &str) -> Result<Self, AppError> {
        let start = start.trim();
        let end = end.trim();
        if start.is_empty() || end.is_empty() {
            return Err(AppError::InvalidValue(format!(
                "marker tokens for '{}' must not be empty",
                name
            )));
        }
        let source = format!(
            r"(?s){}(.*?){}",
            flexible_token_pattern(start),
            flexible_token_pattern(end)
        );
        let pattern = Regex::new(&source)
            .map_err(|err| AppError::InvalidValue(format!("marker '{}': {}", name, err)))?;
        Ok(Self {
            name: name.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_token(&self) -> &str {
        &self.start
    }

    pub fn end_token(&self) -> &str {
        &self.end
    }

    /// Find the slot span in `text`.
    ///
    /// When the pair occurs more than once the first occurrence wins and a
    /// warning is logged.
    ///
    /// # Returns
    /// The first matching [`Span`], or `None` when the slot is absent.
    pub fn locate(&self, text: &str) -> Option<Span> {
        let captures = self.pattern.captures(text)?;
        let full = captures.get(0)?;
        let inner = captures.get(1)?;
        let occurrences = self.count(text);
        if occurrences > 1 {
            tracing::warn!(
                "Marker {} occurs {} times; patching the first occurrence only",
                self.name,
                occurrences
            );
        }
        Some(Span {
            full: full.range(),
            inner: inner.range(),
        })
    }

    /// Count non-overlapping occurrences of this pair in `text`.
    pub fn count(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }
}

impl fmt::Display for MarkerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Locate the span between `start` and `end` in `text`.
///
/// Convenience wrapper over [`MarkerPair::with_tokens`] + [`MarkerPair::locate`].
///
/// # Errors
/// Returns [`AppError::InvalidValue`] when a token is blank.
pub fn locate(text: &str, start: &str, end: &str) -> Result<Option<Span>, AppError> {
    Ok(MarkerPair::with_tokens(start, start, end)?.locate(text))
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Escape `token` for regex use while allowing any whitespace between its
/// word runs and punctuation runs (`/* A */` also matches `/*A*/`).
fn flexible_token_pattern(token: &str) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_is_word: Option<bool> = None;

    for c in token.chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
            current_is_word = None;
            continue;
        }
        let word = is_word_char(c);
        if current_is_word.is_some_and(|prev| prev != word) && !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
        current.push(c);
        current_is_word = Some(word);
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs.iter()
        .map(|run| regex::escape(run))
        .collect::<Vec<_>>()
        .join(r"\s*")
}
