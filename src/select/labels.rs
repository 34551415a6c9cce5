//! Display labels for committed ids.
//!
//! The committed value is only ids, but the control renders labels. Labels
//! are remembered from every source that produces options (search results,
//! commits, the selected-options resolver) and never derived from the value.

use super::option::{OptionId, SelectOption};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct LabelCache<Id> {
    /// id → last option seen for it
    labels: HashMap<Id, SelectOption<Id>>,
}

impl<Id: OptionId> Default for LabelCache<Id> {
    fn default() -> Self {
        Self {
            labels: HashMap::new(),
        }
    }
}

impl<Id: OptionId> LabelCache<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remember(&mut self, option: &SelectOption<Id>) {
        self.labels.insert(option.id.clone(), option.clone());
    }

    pub fn remember_all<'a>(&mut self, options: impl IntoIterator<Item = &'a SelectOption<Id>>) {
        for option in options {
            self.remember(option);
        }
    }

    pub fn get(&self, id: &Id) -> Option<&SelectOption<Id>> {
        self.labels.get(id)
    }

    pub fn label(&self, id: &Id) -> Option<&str> {
        self.get(id).map(|o| o.label.as_str())
    }

    /// Ids with no known label, in the order given.
    pub fn missing<'a>(&self, ids: impl IntoIterator<Item = &'a Id>) -> Vec<Id> {
        ids.into_iter()
            .filter(|id| !self.labels.contains_key(*id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_label_wins() {
        let mut cache = LabelCache::new();
        cache.remember(&SelectOption::new(1u32, "Old Name"));
        cache.remember(&SelectOption::new(1u32, "New Name"));
        assert_eq!(cache.label(&1), Some("New Name"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_preserves_order() {
        let mut cache = LabelCache::new();
        cache.remember_all(&[SelectOption::new(2u32, "two")]);
        assert_eq!(cache.missing(&[3, 2, 1]), vec![3, 1]);
    }
}
