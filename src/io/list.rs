//! Ordered membership lists.
//!
//! Each subsystem keeps the ids of its registered handles in insertion
//! order. The records themselves live in the loop's handle table, so a list
//! only holds ids and never aliases handle memory.

use heapless::Vec;

use super::HandleId;
use crate::error::Error;

/// Fixed-capacity, insertion-ordered set of handle ids.
#[derive(Debug, Clone, Default)]
pub struct List<const N: usize> {
    ids: Vec<HandleId, N>,
}

impl<const N: usize> List<N> {
    /// Creates an empty list.
    pub const fn new() -> Self {
        Self { ids: Vec::new() }
    }

    /// Appends `id` at the tail.
    ///
    /// Appending an id that is already a member leaves the list unchanged.
    pub fn append(&mut self, id: HandleId) -> Result<(), Error> {
        if self.contains(id) {
            return Ok(());
        }
        self.ids.push(id).map_err(|_| Error::Full)
    }

    /// Removes `id`, keeping the order of the remaining members.
    ///
    /// Returns `false` if `id` was not a member.
    pub fn remove(&mut self, id: HandleId) -> bool {
        match self.ids.iter().position(|&member| member == id) {
            Some(index) => {
                self.ids.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `id` is a member.
    pub fn contains(&self, id: HandleId) -> bool {
        self.ids.contains(&id)
    }

    /// First member, if any.
    pub fn head(&self) -> Option<HandleId> {
        self.ids.first().copied()
    }

    /// Removes and returns the first member.
    pub fn pop_front(&mut self) -> Option<HandleId> {
        if self.ids.is_empty() {
            None
        } else {
            Some(self.ids.remove(0))
        }
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` when the list has no members.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Removes every member.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = HandleId> + '_ {
        self.ids.iter().copied()
    }

    /// Copy of the current members.
    ///
    /// Subsystem passes iterate a snapshot so callbacks may start, stop or
    /// close handles of the list being walked.
    pub fn snapshot(&self) -> Vec<HandleId, N> {
        self.ids.clone()
    }
}
