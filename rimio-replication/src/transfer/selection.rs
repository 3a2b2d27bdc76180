use crate::transfer::object_set::ObjectSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Picks objects uniformly at random.
#[derive(Debug, Clone)]
pub struct RandomObjectSelection {
    rng: StdRng,
}

impl RandomObjectSelection {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn select_next_object(&mut self, set: &ObjectSet) -> Option<u64> {
        set.random(&mut self.rng)
    }

    /// Uniform pick among the members of `set` not contained in `excluded`.
    pub fn select_next_object_excluding(
        &mut self,
        set: &ObjectSet,
        excluded: &ObjectSet,
    ) -> Option<u64> {
        let object_no = set.random(&mut self.rng)?;
        if !excluded.contains(object_no) {
            return Some(object_no);
        }

        let candidates: Vec<u64> = set.iter().filter(|o| !excluded.contains(*o)).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.gen_range(0..candidates.len())])
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    generation: u64,
    last: Option<u64>,
}

/// Picks objects in ascending order.
///
/// `select_next_object_of_same_set` walks one set across calls. The cursor
/// remembers the set generation it was started on; if the set was mutated
/// since, the walk restarts at the smallest object.
#[derive(Debug, Clone, Default)]
pub struct SequentialObjectSelection {
    cursor: Option<Cursor>,
}

impl SequentialObjectSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest object of `set`. Repositions the cursor right after it.
    pub fn select_next_object(&mut self, set: &ObjectSet) -> Option<u64> {
        let first = set.first();
        self.cursor = Some(Cursor {
            generation: set.generation(),
            last: first,
        });
        first
    }

    /// Next object of `set` after the previously returned one, or `None`
    /// once the set is exhausted.
    pub fn select_next_object_of_same_set(&mut self, set: &ObjectSet) -> Option<u64> {
        let cursor = match self.cursor {
            Some(cursor) if cursor.generation == set.generation() => cursor,
            _ => Cursor {
                generation: set.generation(),
                last: None,
            },
        };

        let next = match cursor.last {
            None => set.first(),
            Some(last) => set.next_after(last),
        };
        self.cursor = Some(Cursor {
            generation: cursor.generation,
            last: next.or(cursor.last),
        });
        next
    }

    pub fn reset(&mut self) {
        self.cursor = None;
    }
}

/// Rotates through the replicas serving each stripe column.
///
/// Every column `object_no % stripe_width` has its own cursor, so a slow
/// replica on one column does not hold back the others. The replica count is
/// taken from the peer list passed in on each call.
#[derive(Debug, Clone)]
pub struct RoundRobinPeerSelection {
    stripe_width: u32,
    cursors: HashMap<u32, usize>,
}

impl RoundRobinPeerSelection {
    pub fn new(stripe_width: u32) -> Self {
        Self {
            stripe_width: stripe_width.max(1),
            cursors: HashMap::new(),
        }
    }

    pub fn stripe_width(&self) -> u32 {
        self.stripe_width
    }

    pub fn column(&self, object_no: u64) -> u32 {
        (object_no % self.stripe_width as u64) as u32
    }

    pub fn select_next_peer<'a, P>(&mut self, peers: &'a [P], object_no: u64) -> Option<&'a P> {
        if peers.is_empty() {
            return None;
        }
        let column = self.column(object_no);
        let cursor = self.cursors.entry(column).or_insert(0);
        let index = *cursor % peers.len();
        *cursor = (index + 1) % peers.len();
        Some(&peers[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_selection_stays_in_set() {
        let set: ObjectSet = [2, 4, 8].into_iter().collect();
        let mut selection = RandomObjectSelection::new(Some(3));
        for _ in 0..50 {
            assert!(set.contains(selection.select_next_object(&set).unwrap()));
        }
        assert_eq!(selection.select_next_object(&ObjectSet::new()), None);
    }

    #[test]
    fn random_selection_skips_excluded() {
        let set: ObjectSet = [1, 2, 3].into_iter().collect();
        let excluded: ObjectSet = [1, 3].into_iter().collect();
        let mut selection = RandomObjectSelection::new(Some(11));
        for _ in 0..50 {
            assert_eq!(
                selection.select_next_object_excluding(&set, &excluded),
                Some(2)
            );
        }
        assert_eq!(selection.select_next_object_excluding(&set, &set), None);
    }

    #[test]
    fn sequential_walks_same_set() {
        let set: ObjectSet = [5, 1, 9].into_iter().collect();
        let mut selection = SequentialObjectSelection::new();

        assert_eq!(selection.select_next_object_of_same_set(&set), Some(1));
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(5));
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(9));
        assert_eq!(selection.select_next_object_of_same_set(&set), None);
        assert_eq!(selection.select_next_object_of_same_set(&set), None);

        assert_eq!(selection.select_next_object(&set), Some(1));
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(5));
    }

    #[test]
    fn sequential_cursor_restarts_after_mutation() {
        let mut set: ObjectSet = [10, 20, 30].into_iter().collect();
        let mut selection = SequentialObjectSelection::new();

        assert_eq!(selection.select_next_object(&set), Some(10));
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(20));

        set.add(15);
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(10));
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(15));

        set.remove(10);
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(15));
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(20));
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(30));
        assert_eq!(selection.select_next_object_of_same_set(&set), None);

        set.add(40);
        assert_eq!(selection.select_next_object_of_same_set(&set), Some(15));
    }

    #[test]
    fn round_robin_visits_every_peer_per_column() {
        let peers = ["a", "b", "c", "d"];
        let width = 3;
        let mut selection = RoundRobinPeerSelection::new(width);

        let mut column_zero = Vec::new();
        for round in 0..8u64 {
            column_zero.push(*selection.select_next_peer(&peers, round * 3).unwrap());
            // calls for other columns must not disturb column 0
            selection.select_next_peer(&peers, round * 3 + 1).unwrap();
            if round % 2 == 0 {
                selection.select_next_peer(&peers, round * 3 + 2).unwrap();
            }
        }
        assert_eq!(column_zero, vec!["a", "b", "c", "d", "a", "b", "c", "d"]);
    }

    #[test]
    fn round_robin_follows_topology_changes() {
        let mut selection = RoundRobinPeerSelection::new(2);
        let four = [0, 1, 2, 3];
        assert_eq!(selection.select_next_peer(&four, 0), Some(&0));
        assert_eq!(selection.select_next_peer(&four, 0), Some(&1));
        assert_eq!(selection.select_next_peer(&four, 1), Some(&0));
        assert_eq!(selection.select_next_peer(&four, 0), Some(&2));

        // replica removed: the cursor wraps within the smaller list
        let two = [0, 1];
        assert_eq!(selection.select_next_peer(&two, 0), Some(&1));
        assert_eq!(selection.select_next_peer(&two, 0), Some(&0));
        // the other column keeps its own position
        assert_eq!(selection.select_next_peer(&two, 1), Some(&1));

        let none: [u8; 0] = [];
        assert_eq!(selection.select_next_peer(&none, 0), None);
    }
}
