//! Grow-only points-to sets.

use rustc_hash::FxHashSet;

use crate::pta::CsObjId;

/// The set of abstract objects a pointer may refer to.
///
/// Sets only ever grow during a solve; the solver propagates deltas, so
/// [`PointsToSet::insert`] reporting first insertion is the operation
/// everything hinges on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointsToSet {
    objs: FxHashSet<CsObjId>,
}

impl PointsToSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding a single object.
    #[must_use]
    pub fn singleton(obj: CsObjId) -> Self {
        let mut set = Self::new();
        set.insert(obj);
        set
    }

    /// Inserts an object, returning `true` if it was not present.
    pub fn insert(&mut self, obj: CsObjId) -> bool {
        self.objs.insert(obj)
    }

    /// Returns `true` if the set contains `obj`.
    #[must_use]
    pub fn contains(&self, obj: CsObjId) -> bool {
        self.objs.contains(&obj)
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objs.len()
    }

    /// Returns `true` if no object has reached this pointer yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objs.is_empty()
    }

    /// Iterates the objects in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = CsObjId> + '_ {
        self.objs.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_first_insertion() {
        let mut set = PointsToSet::new();
        let o = CsObjId::new(3);
        assert!(set.is_empty());
        assert!(set.insert(o));
        assert!(!set.insert(o));
        assert!(set.contains(o));
        assert_eq!(set.len(), 1);
        assert_eq!(PointsToSet::singleton(o), set);
    }
}
