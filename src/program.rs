//! Program representation

use anyhow::Context;
use std::{fs, path::Path};

use crate::{
    error::Result,
    lexer::{Lexer, Line},
};

/// The immutable list of source lines, addressed by a zero based cursor.
/// Lines are decoded when the cursor reaches them, so a bad line only
/// fails once it is executed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    lines: Vec<String>,
}

impl Program {
    /// Split `source` into lines
    pub fn new(source: &str) -> Self {
        Program {
            lines: source.lines().map(str::to_string).collect(),
        }
    }

    /// Read a program from a file on disk
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read program {}", path.display()))?;
        Ok(Program::new(&source))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Raw text of the line at `cursor`
    pub fn text(&self, cursor: usize) -> Option<&str> {
        self.lines.get(cursor).map(String::as_str)
    }

    /// Decode the line at `cursor`. `Ok(None)` for a blank line.
    pub fn decode(&self, cursor: usize) -> Result<Option<Line<'_>>> {
        match self.text(cursor) {
            Some(text) => Lexer::new(text).decode(),
            None => Ok(None),
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for Program {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Program {
            lines: iter.into_iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}
