//! The committed value of a select control.
//!
//! The owner of the control holds this value; the control only proposes
//! replacements. `Option<Id>` is a single select, `IndexSet<Id>` a multi
//! select that keeps insertion order.

use super::option::OptionId;
use indexmap::IndexSet;
use std::fmt::Debug;

pub trait Selection<Id>: Clone + Default + PartialEq + Debug {
    /// Multi selects stay open after a commit; single selects close.
    const MULTIPLE: bool;

    fn contains(&self, id: &Id) -> bool;

    fn ids(&self) -> Vec<&Id>;

    fn is_empty(&self) -> bool;

    /// Value after committing `id`, or `None` when committing changes nothing.
    fn commit(&self, id: Id) -> Option<Self>;

    /// Value without `id`, or `None` when `id` is not selected.
    fn remove(&self, id: &Id) -> Option<Self>;

    /// Value without its most recently committed id, or `None` when empty.
    fn pop_last(&self) -> Option<Self>;
}

impl<Id: OptionId> Selection<Id> for Option<Id> {
    const MULTIPLE: bool = false;

    fn contains(&self, id: &Id) -> bool {
        self.as_ref() == Some(id)
    }

    fn ids(&self) -> Vec<&Id> {
        self.iter().collect()
    }

    fn is_empty(&self) -> bool {
        self.is_none()
    }

    fn commit(&self, id: Id) -> Option<Self> {
        // Re-selecting the same option still counts: it closes the control.
        Some(Some(id))
    }

    fn remove(&self, id: &Id) -> Option<Self> {
        (self.as_ref() == Some(id)).then_some(None)
    }

    fn pop_last(&self) -> Option<Self> {
        self.is_some().then_some(None)
    }
}

impl<Id: OptionId> Selection<Id> for IndexSet<Id> {
    const MULTIPLE: bool = true;

    fn contains(&self, id: &Id) -> bool {
        IndexSet::contains(self, id)
    }

    fn ids(&self) -> Vec<&Id> {
        self.iter().collect()
    }

    fn is_empty(&self) -> bool {
        IndexSet::is_empty(self)
    }

    fn commit(&self, id: Id) -> Option<Self> {
        if IndexSet::contains(self, &id) {
            return None;
        }
        let mut next = self.clone();
        next.insert(id);
        Some(next)
    }

    fn remove(&self, id: &Id) -> Option<Self> {
        if !IndexSet::contains(self, id) {
            return None;
        }
        let mut next = self.clone();
        next.shift_remove(id);
        Some(next)
    }

    fn pop_last(&self) -> Option<Self> {
        let mut next = self.clone();
        next.pop()?;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_commit_replaces() {
        let value: Option<u32> = Some(1);
        assert_eq!(value.commit(2), Some(Some(2)));
        assert_eq!(value.remove(&2), None);
        assert_eq!(value.remove(&1), Some(None));
        assert_eq!(value.pop_last(), Some(None));
        assert_eq!(None::<u32>.pop_last(), None);
    }

    #[test]
    fn multi_commit_appends_without_duplicates() {
        let value: IndexSet<u32> = IndexSet::from([3, 1]);
        let next = value.commit(2).unwrap();
        assert_eq!(next.iter().copied().collect::<Vec<_>>(), vec![3, 1, 2]);
        assert_eq!(next.commit(1), None);
    }

    #[test]
    fn multi_remove_keeps_order() {
        let value: IndexSet<u32> = IndexSet::from([3, 1, 2]);
        let next = value.remove(&1).unwrap();
        assert_eq!(next.iter().copied().collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(next.remove(&9), None);
    }

    #[test]
    fn multi_pop_last_removes_most_recent() {
        let value: IndexSet<u32> = IndexSet::from([3, 1, 2]);
        let next = value.pop_last().unwrap();
        assert_eq!(next.iter().copied().collect::<Vec<_>>(), vec![3, 1]);
        assert_eq!(IndexSet::<u32>::new().pop_last(), None);
    }
}
