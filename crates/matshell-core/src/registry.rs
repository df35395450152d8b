//! Fixed-capacity slot table that owns every live matrix.
//!
//! Insertion is a ring: the slot written is `cursor % capacity`, and an
//! occupant of that slot is destroyed before being replaced. Name lookups
//! scan slots in index order and return the first exact match; duplicate
//! names are allowed.

use crate::error::{InvalidArgument, MatrixError, Result};
use crate::matrix::{Matrix, MatrixName};

/// Where an insert landed and which matrix, if any, it displaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    pub slot: usize,
    pub evicted: Option<MatrixName>,
}

#[derive(Debug)]
pub struct Registry {
    slots: Box<[Option<Matrix>]>,
    cursor: u64,
}

impl Registry {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(InvalidArgument::ZeroCapacity.into());
        }
        let slots = std::iter::repeat_with(|| None)
            .take(capacity)
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Ok(Self { slots, cursor: 0 })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of inserts performed so far.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Slot the next insert will write to.
    pub fn next_slot(&self) -> usize {
        (self.cursor % self.slots.len() as u64) as usize
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn insert(&mut self, matrix: Matrix) -> Insertion {
        let slot = self.next_slot();
        let evicted = self.slots[slot].replace(matrix).map(|old| {
            let name = old.name().clone();
            old.destroy();
            name
        });
        self.cursor += 1;
        tracing::debug!(
            slot,
            cursor = self.cursor,
            evicted = evicted.as_ref().map(MatrixName::as_str),
            "slot written"
        );
        Insertion { slot, evicted }
    }

    /// First slot, in index order, whose occupant is named exactly `name`.
    pub fn find_by_name(&self, name: &str) -> Result<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|m| m.name() == name))
            .ok_or_else(|| not_found(name))
    }

    pub fn get(&self, slot: usize) -> Option<&Matrix> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn lookup(&self, name: &str) -> Result<&Matrix> {
        self.iter()
            .map(|(_, m)| m)
            .find(|m| m.name() == name)
            .ok_or_else(|| not_found(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Matrix> {
        self.slots
            .iter_mut()
            .filter_map(Option::as_mut)
            .find(|m| m.name() == name)
            .ok_or_else(|| not_found(name))
    }

    /// Destroys the occupant of `slot`. An already empty slot is reported,
    /// never released twice.
    pub fn destroy(&mut self, slot: usize) -> Result<()> {
        match self.slots.get_mut(slot).and_then(Option::take) {
            Some(m) => {
                m.destroy();
                Ok(())
            }
            None => Err(MatrixError::AlreadyDestroyed { slot }),
        }
    }

    /// Destroys every occupant and returns how many were released. Safe to
    /// call repeatedly; later calls release nothing.
    pub fn destroy_all(&mut self) -> usize {
        let mut released = 0;
        for slot in self.slots.iter_mut() {
            if let Some(m) = slot.take() {
                m.destroy();
                released += 1;
            }
        }
        released
    }

    /// Occupied slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Matrix)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|m| (i, m)))
    }
}

fn not_found(name: &str) -> MatrixError {
    MatrixError::NotFound {
        name: name.to_string(),
    }
}
