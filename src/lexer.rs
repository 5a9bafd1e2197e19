use super::token::Op;
use crate::error::{Error, Result};

/// A decoded source line: a command and its optional argument token
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Line<'a> {
    pub op: Op,
    pub arg: Option<&'a str>,
}

pub struct Lexer<'a> {
    line: &'a str,
    cursor: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Self {
        Lexer { line, cursor: 0 }
    }

    /// Decode the whole line. `Ok(None)` for a blank line.
    pub fn decode(mut self) -> Result<Option<Line<'a>>> {
        let name = match self.next_word() {
            Some(name) => name,
            None => return Ok(None),
        };
        let arg = self.next_word();

        if self.next_word().is_some() {
            return Err(self.syntax_error());
        }
        let op = Op::new(name).ok_or_else(|| self.syntax_error())?;

        Ok(Some(Line { op, arg }))
    }

    /// Get the next whitespace delimited word. This consumes it.
    fn next_word(&mut self) -> Option<&'a str> {
        self.trim();

        let start_pos = self.cursor;
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                break;
            }
            self.cursor += ch.len_utf8();
        }

        if start_pos == self.cursor {
            None
        } else {
            Some(&self.line[start_pos..self.cursor])
        }
    }

    /// Skip spaces, tabs, carriage returns and other whitespace
    fn trim(&mut self) {
        while let Some(ch) = self.peek_char() {
            if !ch.is_whitespace() {
                break;
            }
            self.cursor += ch.len_utf8();
        }
    }

    /// Look at the char under the cursor without consuming it
    fn peek_char(&self) -> Option<char> {
        self.line[self.cursor..].chars().next()
    }

    fn syntax_error(&self) -> Error {
        Error::Syntax {
            text: self.line.trim().to_string(),
        }
    }
}
