//! Error types returned by the fallible entry points of [`crate::vector`] and
//! [`crate::sequence`].
//!
//! Index-out-of-range on the panicking, `Vec`-like entry points (`Index`,
//! `set`, `insert`, ...) panics with a message built from the same fields
//! as [`IndexError`] rather than returning a `Result` — matching the
//! original design's split between programmer-error-class bugs (panic) and
//! recoverable conditions (`Result`).

use std::fmt;

/// An index was out of the valid `0..len` (or `0..=len`) range for the
/// operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexError {
    pub index: usize,
    pub len: usize,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index {} out of range for sequence of length {}",
            self.index, self.len
        )
    }
}

impl std::error::Error for IndexError {}

/// A slice-assignment (`set_range`) was given a replacement whose length
/// does not match the length of the range being replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueMismatchError {
    pub expected: usize,
    pub found: usize,
}

impl fmt::Display for ValueMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected {} replacement value(s), found {}",
            self.expected, self.found
        )
    }
}

impl std::error::Error for ValueMismatchError {}

/// `remove_value` (or `index_of`-style lookup treated as fallible) did not
/// find the requested value in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueNotFoundError;

impl fmt::Display for ValueNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value not found in sequence")
    }
}

impl std::error::Error for ValueNotFoundError {}
