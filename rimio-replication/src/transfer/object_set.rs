use rand::Rng;
use std::collections::BTreeSet;

/// A set of object numbers of one file.
///
/// Every mutation bumps `generation`, which lets cursors held outside the
/// set detect that they went stale.
#[derive(Debug, Clone, Default)]
pub struct ObjectSet {
    objects: BTreeSet<u64>,
    generation: u64,
}

impl ObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the object was not yet part of the set.
    pub fn add(&mut self, object_no: u64) -> bool {
        let added = self.objects.insert(object_no);
        if added {
            self.generation += 1;
        }
        added
    }

    pub fn remove(&mut self, object_no: u64) -> bool {
        let removed = self.objects.remove(&object_no);
        if removed {
            self.generation += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.objects.is_empty() {
            self.objects.clear();
            self.generation += 1;
        }
    }

    pub fn contains(&self, object_no: u64) -> bool {
        self.objects.contains(&object_no)
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ascending iteration; every call starts from the smallest object.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.objects.iter().copied()
    }

    /// Smallest object strictly greater than `object_no`.
    pub fn next_after(&self, object_no: u64) -> Option<u64> {
        self.objects
            .range(object_no.saturating_add(1)..)
            .next()
            .copied()
            .filter(|&next| next > object_no)
    }

    /// Smallest object of the set. `None` only if the set is empty.
    pub fn first(&self) -> Option<u64> {
        self.objects.first().copied()
    }

    /// Uniformly chosen object. `None` only if the set is empty.
    pub fn random(&self, rng: &mut impl Rng) -> Option<u64> {
        if self.objects.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.objects.len());
        self.objects.iter().nth(index).copied()
    }
}

impl PartialEq for ObjectSet {
    fn eq(&self, other: &Self) -> bool {
        self.objects == other.objects
    }
}

impl Eq for ObjectSet {}

impl FromIterator<u64> for ObjectSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut set = ObjectSet::new();
        for object_no in iter {
            set.add(object_no);
        }
        set
    }
}

impl Extend<u64> for ObjectSet {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        for object_no in iter {
            self.add(object_no);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn add_is_idempotent() {
        let mut set = ObjectSet::new();
        assert!(set.is_empty());
        assert!(set.add(4));
        assert!(!set.add(4));
        assert!(set.add(1));
        assert_eq!(set.len(), 2);
        assert!(set.contains(4));
        assert!(!set.contains(2));
        assert_eq!(set.first(), Some(1));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 4]);
    }

    #[test]
    fn generation_moves_only_on_change() {
        let mut set: ObjectSet = [3, 5].into_iter().collect();
        let generation = set.generation();
        set.add(3);
        set.remove(9);
        assert_eq!(set.generation(), generation);

        set.remove(3);
        assert_eq!(set.generation(), generation + 1);
        set.clear();
        assert_eq!(set.generation(), generation + 2);
        set.clear();
        assert_eq!(set.generation(), generation + 2);
    }

    #[test]
    fn next_after_skips_to_successor() {
        let set: ObjectSet = [0, 3, 7, u64::MAX].into_iter().collect();
        assert_eq!(set.next_after(0), Some(3));
        assert_eq!(set.next_after(4), Some(7));
        assert_eq!(set.next_after(7), Some(u64::MAX));
        assert_eq!(set.next_after(u64::MAX), None);
    }

    #[test]
    fn random_covers_every_member() {
        let set: ObjectSet = (10..20).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = ObjectSet::new();
        for _ in 0..1000 {
            let object_no = set.random(&mut rng).unwrap();
            assert!(set.contains(object_no));
            seen.add(object_no);
        }
        assert_eq!(seen, set);
        assert!(ObjectSet::new().random(&mut rng).is_none());
        assert!(ObjectSet::new().first().is_none());
    }
}
