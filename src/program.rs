// SPDX-FileCopyrightText: 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

//! Loading Intcode programs from their comma-separated text form
//!
//! A [Program] is the immutable image that a [Machine](crate::Machine) is loaded from, and that it
//! restores its memory from on [reset](crate::Machine::reset).

use std::error::Error;
use std::fmt::{self, Display};
use std::io::{self, Read};
use std::num::ParseIntError;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// An immutable Intcode program.
///
/// Cloning a `Program` is cheap, as clones share the same underlying allocation.
///
/// # Example
///
/// ```
/// use intcomputer::Program;
/// let program: Program = "1,0,0,0,99\n".parse().unwrap();
/// assert_eq!(&program[..], &[1, 0, 0, 0, 99]);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Program(Arc<[i64]>);

impl Program {
    /// Collect `code` into a new program
    pub fn new(code: impl IntoIterator<Item = i64>) -> Self {
        code.into_iter().collect()
    }

    /// Read the entirety of `reader` and parse it as program text
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if reading fails, or any error [`Program::from_str`] can return.
    pub fn read_from(mut reader: impl Read) -> Result<Self, LoadError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        text.parse()
    }

    /// The program's integers, in load order
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl Deref for Program {
    type Target = [i64];
    fn deref(&self) -> &[i64] {
        &self.0
    }
}

impl FromIterator<i64> for Program {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<i64>> for Program {
    fn from(code: Vec<i64>) -> Self {
        Self(code.into())
    }
}

impl FromStr for Program {
    type Err = LoadError;

    /// Parse comma-separated decimal integers. Whitespace around the text as a whole and around
    /// each individual number is ignored.
    fn from_str(text: &str) -> Result<Self, LoadError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LoadError::Empty);
        }
        text.split(',')
            .map(str::trim)
            .enumerate()
            .map(|(index, token)| {
                token.parse().map_err(|source| LoadError::InvalidToken {
                    index,
                    token: Box::from(token),
                    source,
                })
            })
            .collect()
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Program").field(&&self.0[..]).finish()
    }
}

impl Display for Program {
    /// Writes the program back out in its comma-separated text form
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ints = self.0.iter();
        if let Some(first) = ints.next() {
            write!(f, "{first}")?;
        }
        for i in ints {
            write!(f, ",{i}")?;
        }
        Ok(())
    }
}

/// An error encountered while loading program text
#[derive(Debug)]
pub enum LoadError {
    /// The text contained no integers at all
    Empty,
    /// A comma-separated token was not a valid integer
    InvalidToken {
        /// Position of the token within the program
        index: usize,
        /// The token, with surrounding whitespace removed
        token: Box<str>,
        /// Why the token failed to parse
        source: ParseIntError,
    },
    /// Reading the program text failed
    Io(io::Error),
}

impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (
                Self::InvalidToken {
                    index: lhs_index,
                    token: lhs_token,
                    ..
                },
                Self::InvalidToken {
                    index: rhs_index,
                    token: rhs_token,
                    ..
                },
            ) => lhs_index == rhs_index && lhs_token == rhs_token,
            _ => false,
        }
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Empty => write!(f, "program text contains no integers"),
            LoadError::InvalidToken {
                index,
                token,
                source,
            } => write!(f, "integer #{index} ({token:?}) is invalid: {source}"),
            LoadError::Io(e) => write!(f, "failed to read program text: {e}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Empty => None,
            LoadError::InvalidToken { source, .. } => Some(source),
            LoadError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
