use super::{NodeIdx, VresIdx};
use std::collections::HashMap;

/// Position in the undo log of a [ConflictTracker].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Tracks which exclusive virtual resources are occupied in which state.
///
/// Every occupation is recorded in an undo log so that a tentative set of
/// placements can be reverted with [ConflictTracker::rollback].
#[derive(Debug, Default)]
pub struct ConflictTracker {
    occupied: HashMap<(VresIdx, usize), NodeIdx>,
    log: Vec<(VresIdx, usize)>,
}

impl ConflictTracker {
    pub fn is_occupied(&self, vres: VresIdx, st_index: usize) -> bool {
        self.occupied.contains_key(&(vres, st_index))
    }

    pub fn occupant(&self, vres: VresIdx, st_index: usize) -> Option<NodeIdx> {
        self.occupied.get(&(vres, st_index)).copied()
    }

    /// Mark `vres` as used by `node` in `st_index`. Returns `false` and
    /// changes nothing if the slot is already taken.
    pub fn occupy(
        &mut self,
        vres: VresIdx,
        st_index: usize,
        node: NodeIdx,
    ) -> bool {
        if self.is_occupied(vres, st_index) {
            return false;
        }
        self.occupied.insert((vres, st_index), node);
        self.log.push((vres, st_index));
        true
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.log.len())
    }

    /// Undo every occupation made since `cp` was taken.
    pub fn rollback(&mut self, cp: Checkpoint) {
        while self.log.len() > cp.0 {
            if let Some(slot) = self.log.pop() {
                self.occupied.remove(&slot);
            }
        }
    }

    pub fn clear(&mut self) {
        self.occupied.clear();
        self.log.clear();
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_restores_checkpoint() {
        let (r0, r1) = (VresIdx::from(0usize), VresIdx::from(1usize));
        let mut tracker = ConflictTracker::default();
        assert!(tracker.occupy(r0, 0, NodeIdx::from(0usize)));
        let cp = tracker.checkpoint();
        assert!(tracker.occupy(r0, 1, NodeIdx::from(1usize)));
        assert!(tracker.occupy(r1, 0, NodeIdx::from(2usize)));
        assert!(!tracker.occupy(r0, 0, NodeIdx::from(3usize)));
        assert_eq!(tracker.len(), 3);

        tracker.rollback(cp);
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.occupant(r0, 0), Some(NodeIdx::from(0usize)));
        assert!(!tracker.is_occupied(r0, 1));
        assert!(!tracker.is_occupied(r1, 0));
    }
}
