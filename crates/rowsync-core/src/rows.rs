use thiserror::Error;

use crate::transition::Transition;

/// Which part of a transition failed to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOp {
    Delete,
    Insert,
    Update,
}

/// Errors that can occur while applying a transition to a row list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowApplyError {
    /// The transition was computed against a sequence of a different length.
    #[error("transition expects {expected} rows but the list holds {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// An operation referenced a position outside the list.
    #[error("{op:?} at position {index} is out of bounds for {len} rows")]
    IndexOutOfBounds { op: RowOp, index: usize, len: usize },
    /// The list did not end up with the length the transition announced.
    #[error("transition should leave {expected} rows but produced {actual}")]
    FinalLengthMismatch { expected: usize, actual: usize },
}

/// In-memory rendering of a list that consumes transitions the way a table view does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowList<T> {
    rows: Vec<T>,
}

impl<T> Default for RowList<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T> RowList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<T>) -> Self {
        Self { rows }
    }

    /// Current rows in view order.
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    /// Apply deletions back-to-front, then insertions front-to-back, then updates.
    ///
    /// The list is left untouched when the transition does not fit it.
    pub fn apply(&mut self, transition: Transition<T>) -> Result<(), RowApplyError> {
        self.check_fits(&transition)?;

        let Transition {
            deleted,
            inserted,
            updated,
            new_len,
            ..
        } = transition;

        for &index in deleted.iter().rev() {
            self.rows.remove(index);
        }
        for (index, row) in inserted {
            self.rows.insert(index, row);
        }
        for (index, row) in updated {
            self.rows[index] = row;
        }

        debug_assert_eq!(self.rows.len(), new_len);
        Ok(())
    }

    // Simulates the length changes so a bad transition never half-applies.
    fn check_fits(&self, transition: &Transition<T>) -> Result<(), RowApplyError> {
        if transition.old_len != self.rows.len() {
            return Err(RowApplyError::LengthMismatch {
                expected: transition.old_len,
                actual: self.rows.len(),
            });
        }

        let mut len = self.rows.len();
        let mut previous: Option<usize> = None;
        for &index in &transition.deleted {
            if index >= self.rows.len() || previous.is_some_and(|previous| previous >= index) {
                return Err(RowApplyError::IndexOutOfBounds {
                    op: RowOp::Delete,
                    index,
                    len: self.rows.len(),
                });
            }
            previous = Some(index);
            len -= 1;
        }
        for &(index, _) in &transition.inserted {
            if index > len {
                return Err(RowApplyError::IndexOutOfBounds {
                    op: RowOp::Insert,
                    index,
                    len,
                });
            }
            len += 1;
        }
        if len != transition.new_len {
            return Err(RowApplyError::FinalLengthMismatch {
                expected: transition.new_len,
                actual: len,
            });
        }
        if let Some(&(index, _)) = transition.updated.iter().find(|(index, _)| *index >= len) {
            return Err(RowApplyError::IndexOutOfBounds {
                op: RowOp::Update,
                index,
                len,
            });
        }
        Ok(())
    }
}
