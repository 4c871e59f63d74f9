//! Fixed-capacity history buffer.

use std::collections::{vec_deque, VecDeque};

/// Ordered history holding at most `CAP` entries, evicting the oldest entry
/// on overflow.
///
/// Entries are kept in chronological order: the first one is the oldest.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ring<T, const CAP: usize>(VecDeque<T>);

impl<T, const CAP: usize> Ring<T, CAP> {
    /// Maximum number of entries in this [`Ring`].
    pub const CAPACITY: usize = CAP;

    /// Creates a new empty [`Ring`].
    #[must_use]
    pub fn new() -> Self {
        Self(VecDeque::with_capacity(CAP))
    }

    /// Appends the provided `entry`, returning the evicted oldest one, if
    /// any.
    pub fn push(&mut self, entry: T) -> Option<T> {
        if CAP == 0 {
            return Some(entry);
        }
        let evicted = (self.0.len() >= CAP).then(|| self.0.pop_front()).flatten();
        self.0.push_back(entry);
        evicted
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.0.back()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether this [`Ring`] has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries from the oldest to the most recent one.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T, const CAP: usize> Default for Ring<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects the entries in order, keeping only the last `CAP` ones.
impl<T, const CAP: usize> FromIterator<T> for Ring<T, CAP> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ring = Self::new();
        for entry in iter {
            _ = ring.push(entry);
        }
        ring
    }
}

impl<T, const CAP: usize> IntoIterator for Ring<T, CAP> {
    type Item = T;
    type IntoIter = vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T, const CAP: usize> IntoIterator for &'a Ring<T, CAP> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod spec {
    use super::Ring;

    #[test]
    fn evicts_oldest() {
        let mut ring = Ring::<u32, 3>::new();
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.push(3), None);
        assert_eq!(ring.push(4), Some(1));
        assert_eq!(ring.push(5), Some(2));

        assert_eq!(ring.len(), 3);
        assert_eq!(ring.last(), Some(&5));
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), [3, 4, 5]);
    }

    #[test]
    fn collects_last_entries() {
        let ring = (1..=25).collect::<Ring<u32, 10>>();

        assert_eq!(ring.len(), Ring::<u32, 10>::CAPACITY);
        assert_eq!(
            ring.into_iter().collect::<Vec<_>>(),
            (16..=25).collect::<Vec<_>>(),
        );
    }

    #[test]
    fn empty() {
        let ring = Ring::<u32, 10>::default();

        assert!(ring.is_empty());
        assert_eq!(ring.last(), None);
    }
}
