//! The backtracking input cursor.
//!
//! A [`Cursor`] reads characters from a [`CharSource`] and keeps the ones it
//! may need to revisit. Grammar productions bracket every attempt with
//! [`push`](Cursor::push) and then either [`drop_checkpoint`](Cursor::drop_checkpoint)
//! (accept) or [`pop`](Cursor::pop) (reject and rewind); [`attempt`](Cursor::attempt)
//! does this bracketing for a closure.
//!
//! Characters stay buffered only while a checkpoint could rewind to them.
//! Once the checkpoint stack is empty, consumed characters are released.

use std::collections::VecDeque;
use std::io;

use super::source::CharSource;
use super::OnMismatch;
use crate::error::{Diagnostic, Expected, PResult, SourceLocation, XmlError};
use crate::util::{log_debug, log_trace};

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    offset: usize,
    line: u32,
    column: u32,
}

/// A character reader with line/column tracking and nested rewind points.
#[derive(Debug)]
pub struct Cursor<S> {
    source: S,
    /// Characters from `base` onwards that have been pulled from the source.
    buffer: VecDeque<char>,
    /// Offset of `buffer[0]`.
    base: usize,
    /// Offset of the next character to read.
    offset: usize,
    line: u32,
    column: u32,
    checkpoints: Vec<Checkpoint>,
    /// One character read ahead of a `\r` while folding line ends.
    carry: Option<char>,
    poisoned: bool,
    io_error: Option<io::Error>,
    last_error: Option<Diagnostic>,
}

impl<S: CharSource> Cursor<S> {
    /// Creates a cursor at line 1, column 1.
    pub fn new(source: S) -> Self {
        Self {
            source,
            buffer: VecDeque::new(),
            base: 0,
            offset: 0,
            line: 1,
            column: 1,
            checkpoints: Vec::new(),
            carry: None,
            poisoned: false,
            io_error: None,
            last_error: None,
        }
    }

    /// Returns the current position.
    #[must_use]
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    /// Returns the number of characters consumed so far.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the next character without consuming it, or `None` at end of input.
    pub fn peek(&mut self) -> Option<char> {
        self.peek_nth(0)
    }

    /// Returns the character `n` positions ahead without consuming anything.
    pub fn peek_nth(&mut self, n: usize) -> Option<char> {
        let index = self.offset - self.base + n;
        while self.buffer.len() <= index {
            let c = self.pull()?;
            self.buffer.push_back(c);
        }
        self.buffer.get(index).copied()
    }

    /// Consumes and returns the next character, or `None` at end of input.
    pub fn read(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        if self.checkpoints.is_empty() {
            self.release();
        }
        Some(c)
    }

    /// Returns `true` if every character has been consumed.
    pub fn at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Remembers the current position.
    pub fn push(&mut self) {
        self.checkpoints.push(Checkpoint {
            offset: self.offset,
            line: self.line,
            column: self.column,
        });
    }

    /// Rewinds to the most recent checkpoint and discards it.
    ///
    /// # Panics
    ///
    /// Panics if there is no checkpoint.
    pub fn pop(&mut self) {
        let Some(cp) = self.checkpoints.pop() else {
            panic!("Cursor::pop without a matching push");
        };
        log_trace!(
            "rewinding from {}:{} to {}:{}",
            self.line,
            self.column,
            cp.line,
            cp.column
        );
        self.offset = cp.offset;
        self.line = cp.line;
        self.column = cp.column;
        if self.checkpoints.is_empty() {
            self.release();
        }
    }

    /// Discards the most recent checkpoint, keeping the current position.
    ///
    /// # Panics
    ///
    /// Panics if there is no checkpoint.
    pub fn drop_checkpoint(&mut self) {
        assert!(
            self.checkpoints.pop().is_some(),
            "Cursor::drop_checkpoint without a matching push"
        );
        if self.checkpoints.is_empty() {
            self.release();
        }
    }

    /// Returns the number of active checkpoints.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }

    /// Runs `f` between a push and a drop (on `Ok`) or pop (on `Err`).
    ///
    /// A failed attempt leaves the cursor exactly where it started.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.push();
        let result = f(self);
        match result {
            Ok(_) => self.drop_checkpoint(),
            Err(_) => self.pop(),
        }
        result
    }

    /// Like [`attempt`](Self::attempt), but any failure is reported as
    /// `expected` at the starting position.
    pub fn attempt_as<T>(
        &mut self,
        expected: Expected,
        f: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let start = self.location();
        self.attempt(f)
            .map_err(|_| Diagnostic::new(expected, start))
    }

    /// Builds a failure for `expected` at the current position.
    pub fn fail<T>(&self, expected: Expected) -> PResult<T> {
        Err(Diagnostic::new(expected, self.location()))
    }

    /// Converts a production result into what a caller-facing entry point returns.
    ///
    /// A mismatch is recorded as the last error and then either reported as
    /// `Ok(None)` or raised, depending on `mode`. An I/O failure of the source
    /// is always raised, since the mismatch it caused says nothing about the
    /// document.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Io` after a source failure, and `XmlError::Parse` for
    /// a mismatch in [`OnMismatch::Raise`] mode.
    pub fn finish<T>(&mut self, result: PResult<T>, mode: OnMismatch) -> Result<Option<T>, XmlError> {
        if let Some(e) = self.io_error.take() {
            return Err(XmlError::Io(e));
        }
        match result {
            Ok(value) => Ok(Some(value)),
            Err(diag) => {
                log_debug!("parse failed: {}", diag);
                self.last_error = Some(diag.clone());
                match mode {
                    OnMismatch::Absent => Ok(None),
                    OnMismatch::Raise => Err(diag.into()),
                }
            }
        }
    }

    /// Like [`finish`](Self::finish) in [`OnMismatch::Raise`] mode, for
    /// callers that always want a value or an error.
    ///
    /// # Errors
    ///
    /// Returns the I/O failure of the source or the mismatch.
    pub fn complete<T>(&mut self, result: PResult<T>) -> Result<T, XmlError> {
        if let Some(e) = self.io_error.take() {
            return Err(XmlError::Io(e));
        }
        result.map_err(|diag| {
            log_debug!("parse failed: {}", diag);
            self.last_error = Some(diag.clone());
            diag.into()
        })
    }

    /// Returns the diagnostic recorded by the most recent failed entry point.
    #[must_use]
    pub fn last_error(&self) -> Option<&Diagnostic> {
        self.last_error.as_ref()
    }

    /// Raises the diagnostic recorded by the most recent failed entry point.
    ///
    /// # Errors
    ///
    /// Returns `XmlError::Parse` if a failure was recorded.
    pub fn raise_last_error(&self) -> Result<(), XmlError> {
        match &self.last_error {
            Some(diag) => Err(diag.clone().into()),
            None => Ok(()),
        }
    }

    /// Takes the I/O error that stopped the source, if any.
    ///
    /// The cursor stays at end of input afterwards.
    pub fn take_io_error(&mut self) -> Option<io::Error> {
        self.io_error.take()
    }

    /// Returns `true` once the source has failed.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Gives back the character source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Pulls one character, folding `\r\n` and lone `\r` into `\n`.
    fn pull(&mut self) -> Option<char> {
        let c = match self.carry.take() {
            Some(c) => c,
            None => self.next_from_source()?,
        };
        if c == '\r' {
            match self.next_from_source() {
                Some('\n') | None => {}
                Some(other) => self.carry = Some(other),
            }
            return Some('\n');
        }
        Some(c)
    }

    fn next_from_source(&mut self) -> Option<char> {
        if self.poisoned {
            return None;
        }
        match self.source.next_char() {
            Ok(c) => c,
            Err(e) => {
                log_debug!("character source failed at {}: {}", self.location(), e);
                self.poisoned = true;
                self.io_error = Some(e);
                None
            }
        }
    }

    fn release(&mut self) {
        let consumed = self.offset - self.base;
        self.buffer.drain(..consumed);
        self.base = self.offset;
    }
}
