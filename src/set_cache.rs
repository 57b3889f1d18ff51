//! Ordered sets of the active (workout, exercise) pair.
//!
//! The cache is the single source of truth for what the session shows.
//! Structural changes (`load`, `append`, `remove`) must be followed by
//! [`SetCache::renumber`], the only place `set_number` is ever rewritten.

use crate::error::SessionError;
use crate::models::{Set, SetId, SetPatch};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SetCache {
    sets: Vec<Set>,
}

impl SetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache. Absent input leaves it empty.
    pub fn load(&mut self, sets: Option<Vec<Set>>) {
        self.sets = sets.unwrap_or_default();
        self.sort();
    }

    /// Add a persisted set, keeping ascending `set_number` order.
    ///
    /// Server responses may arrive in any order, so this re-sorts instead of
    /// assuming the new set belongs at the end.
    pub fn append(&mut self, set: Set) {
        self.sets.push(set);
        self.sort();
    }

    /// Merge `patch` into the set with `id`.
    pub fn update(&mut self, id: &SetId, patch: &SetPatch) -> Result<&Set, SessionError> {
        let set = self
            .sets
            .iter_mut()
            .find(|s| s.id.as_ref() == Some(id))
            .ok_or_else(|| SessionError::UnknownSet(id.clone()))?;

        if let Some(weight) = patch.actual_weight {
            set.actual_weight = weight;
        }
        if let Some(reps) = patch.actual_reps {
            set.actual_reps = reps;
        }
        if let Some(rir) = patch.actual_rir {
            set.actual_rir = rir;
        }
        if let Some(notes) = &patch.notes {
            set.notes = notes.clone();
        }
        Ok(set)
    }

    pub fn remove(&mut self, id: &SetId) -> Option<Set> {
        let pos = self.sets.iter().position(|s| s.id.as_ref() == Some(id))?;
        Some(self.sets.remove(pos))
    }

    /// Reassign `set_number` to each set's 1-based position.
    pub fn renumber(&mut self) {
        for (idx, set) in self.sets.iter_mut().enumerate() {
            set.set_number = idx as u32 + 1;
        }
    }

    pub fn get(&self, id: &SetId) -> Option<&Set> {
        self.sets.iter().find(|s| s.id.as_ref() == Some(id))
    }

    pub fn contains(&self, id: &SetId) -> bool {
        self.get(id).is_some()
    }

    pub fn sets(&self) -> &[Set] {
        &self.sets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Set> {
        self.sets.iter()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Number the next logged set will get.
    pub fn next_set_number(&self) -> u32 {
        self.sets.len() as u32 + 1
    }

    pub fn last(&self) -> Option<&Set> {
        self.sets.last()
    }

    fn sort(&mut self) {
        // Stable: equal numbers keep arrival order.
        self.sets.sort_by_key(|s| s.set_number);
    }
}

impl<'a> IntoIterator for &'a SetCache {
    type Item = &'a Set;
    type IntoIter = std::slice::Iter<'a, Set>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}

#[cfg(test)]
pub(crate) fn test_set(id: &str, number: u32, weight: f64, reps: u32) -> Set {
    Set {
        id: Some(SetId::new(id)),
        set_number: number,
        actual_weight: weight,
        actual_reps: reps,
        actual_rir: None,
        notes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(cache: &SetCache) -> Vec<u32> {
        cache.iter().map(|s| s.set_number).collect()
    }

    fn ids(cache: &SetCache) -> Vec<&str> {
        cache
            .iter()
            .map(|s| s.id.as_ref().map(SetId::as_str).unwrap_or("-"))
            .collect()
    }

    #[test]
    fn load_absent_input_is_empty() {
        let mut cache = SetCache::new();
        cache.append(test_set("a", 1, 60.0, 8));
        cache.load(None);
        assert!(cache.is_empty());
        assert_eq!(cache.next_set_number(), 1);
    }

    #[test]
    fn load_sorts_by_set_number() {
        let mut cache = SetCache::new();
        cache.load(Some(vec![
            test_set("c", 3, 60.0, 8),
            test_set("a", 1, 60.0, 8),
            test_set("b", 2, 60.0, 8),
        ]));
        assert_eq!(ids(&cache), vec!["a", "b", "c"]);
    }

    #[test]
    fn append_out_of_order_resorts() {
        let mut cache = SetCache::new();
        cache.append(test_set("b", 2, 60.0, 8));
        cache.append(test_set("a", 1, 60.0, 8));
        assert_eq!(ids(&cache), vec!["a", "b"]);
    }

    #[test]
    fn renumber_is_dense_after_mixed_operations() {
        let mut cache = SetCache::new();
        for (i, id) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            cache.append(test_set(id, i as u32 + 1, 60.0, 8));
            cache.renumber();
        }
        cache.remove(&SetId::new("b"));
        cache.renumber();
        cache.remove(&SetId::new("e"));
        cache.renumber();
        cache.append(test_set("f", cache.next_set_number(), 60.0, 8));
        cache.renumber();
        cache.remove(&SetId::new("a"));
        cache.renumber();

        assert_eq!(ids(&cache), vec!["c", "d", "f"]);
        assert_eq!(numbers(&cache), vec![1, 2, 3]);
    }

    #[test]
    fn renumber_fixes_gaps_from_server() {
        let mut cache = SetCache::new();
        cache.load(Some(vec![test_set("a", 2, 60.0, 8), test_set("b", 7, 60.0, 8)]));
        cache.renumber();
        assert_eq!(numbers(&cache), vec![1, 2]);
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut cache = SetCache::new();
        let mut set = test_set("a", 1, 60.0, 8);
        set.notes = Some("belt".into());
        cache.append(set);

        let patch = SetPatch {
            actual_weight: Some(62.5),
            actual_rir: Some(Some(2)),
            ..Default::default()
        };
        let updated = cache.update(&SetId::new("a"), &patch).unwrap();
        assert_eq!(updated.actual_weight, 62.5);
        assert_eq!(updated.actual_reps, 8);
        assert_eq!(updated.actual_rir, Some(2));
        assert_eq!(updated.notes.as_deref(), Some("belt"));
    }

    #[test]
    fn update_unknown_id_is_an_error() {
        let mut cache = SetCache::new();
        let err = cache
            .update(&SetId::new("missing"), &SetPatch::default())
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownSet(SetId::new("missing")));
    }

    #[test]
    fn remove_unknown_id_is_none() {
        let mut cache = SetCache::new();
        cache.append(test_set("a", 1, 60.0, 8));
        assert!(cache.remove(&SetId::new("z")).is_none());
        assert_eq!(cache.len(), 1);
    }
}
