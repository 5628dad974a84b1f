//! List scheduler for a single basic block.
//!
//! Nodes are placed in topological order of a constraint graph made of the
//! data path edges and of edges that hold transition nodes back until
//! everything else is placed. Among ready nodes, the one with the lowest
//! floor goes first, ties going to program order. Exclusive resources are
//! kept to one use per replica and state by the conflict tracker.
use super::{BlockSchedule, InsnPlacement};
use crate::analysis::{
    BBDataPath, ConflictTracker, EdgeKind, NodeIdx, VirtualResourceSet,
};
use itertools::Itertools;
use smallvec::SmallVec;
use std::{cmp::Reverse, collections::BinaryHeap};
use wiresched_utils::{Error, IndexRef, SchedResult, SecondaryMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Unscheduled,
    /// Placed, but the block may still be rolled back.
    Tentative,
    Committed,
}

pub struct BBScheduler<'a> {
    data_path: &'a mut BBDataPath,
    tracker: &'a mut ConflictTracker,
    vrset: &'a VirtualResourceSet,
    max_delay: u32,
    max_states: Option<usize>,
    status: SecondaryMap<NodeIdx, Placement>,
}

impl<'a> BBScheduler<'a> {
    pub fn new(
        data_path: &'a mut BBDataPath,
        tracker: &'a mut ConflictTracker,
        vrset: &'a VirtualResourceSet,
        max_delay: u32,
    ) -> Self {
        BBScheduler {
            data_path,
            tracker,
            vrset,
            max_delay,
            max_states: None,
            status: SecondaryMap::new(),
        }
    }

    /// Treat schedules longer than `max_states` as infeasible.
    pub fn with_max_states(mut self, max_states: Option<usize>) -> Self {
        self.max_states = max_states;
        self
    }

    pub fn status(&self, node: NodeIdx) -> Placement {
        *self.status.get(node)
    }

    /// Schedule the block. The data path must have been annotated with
    /// delays. On failure, nothing stays placed and the tracker is back to
    /// where it was when scheduling started.
    pub fn schedule(&mut self) -> SchedResult<BlockSchedule> {
        self.clear_schedule();
        let cp = self.tracker.checkpoint();
        match self.place_all() {
            Ok(num_states) => {
                for n in self.data_path.nodes().map(|(n, _)| n).collect_vec() {
                    self.status.insert(n, Placement::Committed);
                }
                Ok(self.block_schedule(num_states))
            }
            Err(e) => {
                self.tracker.rollback(cp);
                self.reset_nodes();
                Err(e.in_block(self.data_path.bb()))
            }
        }
    }

    fn clear_schedule(&mut self) {
        self.reset_nodes();
        self.tracker.clear();
    }

    /// Put every node back in its initial state.
    fn reset_nodes(&mut self) {
        let nodes = self.data_path.nodes().map(|(n, _)| n).collect_vec();
        for n in nodes {
            let node = self.data_path.node_mut(n);
            node.set_final_st_index(node.initial_st_index());
            node.state_local_delay = 0;
        }
        self.status.clear();
    }

    /// Successors of every node in the constraint graph.
    fn constraint_graph(&self) -> Vec<SmallVec<[NodeIdx; 4]>> {
        let dp = &self.data_path;
        let mut succs: Vec<SmallVec<[NodeIdx; 4]>> =
            vec![SmallVec::new(); dp.num_nodes()];
        for (_, edge) in dp.edges() {
            succs[edge.source.index()].push(edge.sink);
        }
        let transitions = dp
            .nodes()
            .filter(|(_, node)| node.is_transition())
            .map(|(n, _)| n)
            .collect_vec();
        if transitions.is_empty() {
            return succs;
        }
        // Everything downstream of a transition is placed after it anyway.
        let mut downstream = vec![false; dp.num_nodes()];
        let mut stack = transitions.clone();
        while let Some(n) = stack.pop() {
            for s in &succs[n.index()] {
                if !downstream[s.index()] {
                    downstream[s.index()] = true;
                    stack.push(*s);
                }
            }
        }
        for (n, node) in dp.nodes() {
            if node.is_transition() || downstream[n.index()] {
                continue;
            }
            for tr in &transitions {
                succs[n.index()].push(*tr);
            }
        }
        succs
    }

    /// Place every node and return the number of states of the block.
    fn place_all(&mut self) -> SchedResult<usize> {
        let succs = self.constraint_graph();
        let mut indegree = vec![0usize; succs.len()];
        for s in succs.iter().flatten() {
            indegree[s.index()] += 1;
        }
        let mut ready: BinaryHeap<Reverse<(usize, NodeIdx)>> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| {
                let n = NodeIdx::new(n);
                Reverse((self.floor(n, 0), n))
            })
            .collect();

        // Last state used by a non-transition node.
        let mut last_state = 0;
        let mut placed = 0;
        while let Some(Reverse((floor, n))) = ready.pop() {
            let st = if self.data_path.node(n).is_transition() {
                self.place(n, floor.max(last_state))
            } else {
                self.place(n, floor)
            };
            self.commit_to_state(n, st);
            if !self.data_path.node(n).is_transition() {
                last_state = last_state.max(st);
            }
            placed += 1;
            for s in &succs[n.index()] {
                indegree[s.index()] -= 1;
                if indegree[s.index()] == 0 {
                    ready.push(Reverse((self.floor(*s, last_state), *s)));
                }
            }
        }

        if placed < succs.len() {
            return Err(Error::infeasible(format!(
                "{} instruction(s) have circular ordering constraints",
                succs.len() - placed
            )));
        }
        let num_states = self
            .data_path
            .nodes()
            .map(|(_, node)| node.final_st_index() + 1)
            .max()
            .unwrap_or(0)
            .max(self.data_path.num_states());
        if let Some(max_states) = self.max_states {
            if num_states > max_states {
                return Err(Error::infeasible(format!(
                    "needs {num_states} state(s), at most {max_states} allowed"
                )));
            }
        }
        log::debug!(
            "{}: {} node(s) in {} state(s)",
            self.data_path.bb(),
            placed,
            num_states
        );
        Ok(num_states)
    }

    /// Lowest state `n` may be placed in given its placed predecessors.
    fn floor(&self, n: NodeIdx, last_state: usize) -> usize {
        let dp = &self.data_path;
        let node = dp.node(n);
        let mut floor = node.initial_st_index();
        for e in node.source_edges() {
            let edge = dp.edge(*e);
            let src = dp.node(edge.source);
            let gap = match edge.kind {
                EdgeKind::WriteWrite => 1,
                EdgeKind::ReadWrite => 0,
                EdgeKind::WriteRead if !edge.state_local => 1,
                EdgeKind::WriteRead => {
                    let local = src.state_local_delay();
                    usize::from(
                        self.needs_delay_check(n)
                            && local > 0
                            && local.saturating_add(node.node_delay())
                                > self.max_delay,
                    )
                }
            };
            floor = floor.max(src.final_st_index() + gap);
        }
        if node.is_transition() {
            floor = floor.max(last_state);
        }
        floor
    }

    fn needs_delay_check(&self, n: NodeIdx) -> bool {
        self.data_path.node(n).accumulated_delay_from_leaf() > self.max_delay
    }

    /// Delay accumulated in `st` by the W->R predecessors of `n`.
    fn local_delay_before(&self, n: NodeIdx, st: usize) -> u32 {
        self.data_path
            .w_to_r_sources(n)
            .map(|src| self.data_path.node(src))
            .filter(|src| src.final_st_index() == st)
            .map(|src| src.state_local_delay())
            .max()
            .unwrap_or(0)
    }

    /// Find the lowest state at or above `floor` that `n` fits in.
    fn place(&self, n: NodeIdx, floor: usize) -> usize {
        let node = self.data_path.node(n);
        let check_delay = self.needs_delay_check(n);
        let mut st = floor;
        loop {
            if node.is_exclusive()
                && self.tracker.is_occupied(node.virtual_resource(), st)
            {
                st += 1;
                continue;
            }
            if check_delay {
                let local = self.local_delay_before(n, st);
                if local > 0
                    && local.saturating_add(node.node_delay()) > self.max_delay
                {
                    st += 1;
                    continue;
                }
            }
            return st;
        }
    }

    fn commit_to_state(&mut self, n: NodeIdx, st: usize) {
        let local = self.local_delay_before(n, st);
        let node = self.data_path.node_mut(n);
        node.set_final_st_index(st);
        node.state_local_delay = local.saturating_add(node.node_delay());
        let (exclusive, vres) = (node.is_exclusive(), node.virtual_resource());
        if exclusive {
            self.tracker.occupy(vres, st, n);
        }
        self.status.insert(n, Placement::Tentative);
    }

    fn block_schedule(&self, num_states: usize) -> BlockSchedule {
        let insns = self
            .data_path
            .nodes()
            .map(|(_, node)| {
                let vres = self.vrset.get(node.virtual_resource());
                InsnPlacement {
                    insn: node.id(),
                    initial_state: node.initial_st_index(),
                    state: node.final_st_index(),
                    resource: vres.name,
                    replica: vres.replica,
                }
            })
            .collect();
        BlockSchedule {
            bb: self.data_path.bb(),
            num_states,
            insns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DataPathSet;
    use proptest::prelude::*;
    use wiresched_ir::{
        self as ir, BasicBlock, DelayInfo, Insn, InsnId, RegKind,
        ResourceParams, State, TableBuilder, classes,
    };
    use wiresched_utils::ErrorKind;

    fn schedule_table(
        table: &ir::Table,
        max_delay: u32,
        max_states: Option<usize>,
    ) -> SchedResult<(BlockSchedule, BBDataPath)> {
        let mut set = DataPathSet::build(table, |_| 1);
        set.set_delay(table, &DelayInfo::new(max_delay));
        if let Some(e) = set.failures().iter().next() {
            return Err(e.clone());
        }
        let vrset = set.virtual_resource_set();
        let mut dp = set.paths().values().next().unwrap().clone();
        let mut tracker = ConflictTracker::default();
        let sched = BBScheduler::new(&mut dp, &mut tracker, vrset, max_delay)
            .with_max_states(max_states)
            .schedule()?;
        Ok((sched, dp))
    }

    /// `a` writes a wire with delay `da`, `b` reads it with delay `db`.
    fn chained_wire(da: u32, db: u32) -> ir::Table {
        let mut b = TableBuilder::new("main");
        let class = b.add_class("logic", false, false).unwrap();
        let mut add = |name: &str, d: u32| {
            let params: ResourceParams =
                [(ResourceParams::DELAY, d)].into_iter().collect();
            b.add_resource(name, class, params).unwrap()
        };
        let (ra, rb) = (add("a", da), add("b", db));
        let x = b.add_register("x", RegKind::Reg, true).unwrap();
        let r = b.add_register("r", RegKind::Wire, false).unwrap();
        let s = b.add_register("s", RegKind::Reg, false).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![State::new(vec![
                Insn::new(1, ra, &[x], &[r]),
                Insn::new(2, rb, &[r], &[s]),
            ])],
        ))
        .unwrap();
        b.build()
    }

    #[test]
    fn chained_ops_share_a_state_within_budget() {
        let (sched, _) = schedule_table(&chained_wire(2, 3), 6, None).unwrap();
        assert_eq!(sched.state_of(InsnId(1)), Some(0));
        assert_eq!(sched.state_of(InsnId(2)), Some(0));
        assert_eq!(sched.num_states, 1);
    }

    #[test]
    fn chained_ops_split_over_budget() {
        let (sched, dp) = schedule_table(&chained_wire(2, 3), 4, None).unwrap();
        assert_eq!(sched.state_of(InsnId(1)), Some(0));
        assert_eq!(sched.state_of(InsnId(2)), Some(1));
        assert_eq!(sched.num_states, 2);
        let b = dp.node_of(InsnId(2)).unwrap();
        assert_eq!(dp.node(b).state_local_delay(), 3);
    }

    #[test]
    fn huge_delays_saturate() {
        let (sched, dp) =
            schedule_table(&chained_wire(u32::MAX, 3), 4, None).unwrap();
        assert_eq!(sched.state_of(InsnId(2)), Some(1));
        let b = dp.node_of(InsnId(2)).unwrap();
        assert_eq!(dp.node(b).accumulated_delay_from_leaf(), u32::MAX);
    }

    fn two_muls() -> ir::Table {
        let mut b = TableBuilder::new("main");
        b.install_default_classes();
        let mul = b.add_resource_of("mul0", classes::MUL).unwrap();
        let tr = b.add_resource_of("tr0", classes::TRANSITION).unwrap();
        let a = b.add_register("a", RegKind::Reg, true).unwrap();
        let x = b.add_register("x", RegKind::Reg, false).unwrap();
        let y = b.add_register("y", RegKind::Reg, false).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![State::new(vec![
                Insn::new(1, mul, &[a, a], &[x]),
                Insn::new(2, mul, &[a, a], &[y]),
                Insn::new(3, tr, &[], &[]),
            ])],
        ))
        .unwrap();
        b.build()
    }

    #[test]
    fn exclusive_uses_are_serialized_in_program_order() {
        let (sched, _) = schedule_table(&two_muls(), 10, None).unwrap();
        assert_eq!(sched.state_of(InsnId(1)), Some(0));
        assert_eq!(sched.state_of(InsnId(2)), Some(1));
        // The transition moves to the last state.
        assert_eq!(sched.state_of(InsnId(3)), Some(1));
        assert_eq!(sched.num_states, 2);
    }

    #[test]
    fn rescheduling_is_idempotent() {
        let table = two_muls();
        let mut set = DataPathSet::build(&table, |_| 1);
        set.set_delay(&table, &DelayInfo::new(10));
        let vrset = set.virtual_resource_set();
        let mut dp = set.paths().values().next().unwrap().clone();
        let mut tracker = ConflictTracker::default();
        let mut sched = BBScheduler::new(&mut dp, &mut tracker, vrset, 10);
        let first = sched.schedule().unwrap();
        let second = sched.schedule().unwrap();
        assert_eq!(first, second);
        assert!(
            (0..3usize)
                .all(|i| sched.status(NodeIdx::from(i)) == Placement::Committed)
        );
    }

    #[test]
    fn too_many_states_rolls_back() {
        let table = two_muls();
        let mut set = DataPathSet::build(&table, |_| 1);
        set.set_delay(&table, &DelayInfo::new(10));
        let vrset = set.virtual_resource_set();
        let mut dp = set.paths().values().next().unwrap().clone();
        let mut tracker = ConflictTracker::default();
        let mut sched = BBScheduler::new(&mut dp, &mut tracker, vrset, 10)
            .with_max_states(Some(1));
        let err = sched.schedule().unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(err.kind(), ErrorKind::Infeasible(_)));
        assert_eq!(err.block(), Some(0));
        assert_eq!(sched.status(NodeIdx::from(1usize)), Placement::Unscheduled);
        drop(sched);
        assert!(tracker.is_empty());
        assert!(dp.nodes().all(|(_, n)| n.final_st_index() == 0));
    }

    /// `y <- add(x, a)` reads the value of `x` from before `x <- add(a, a)`.
    fn read_before_write() -> ir::Table {
        let mut b = TableBuilder::new("main");
        b.install_default_classes();
        let add = b.add_resource_of("add0", classes::ADD).unwrap();
        let a = b.add_register("a", RegKind::Reg, true).unwrap();
        let x = b.add_register("x", RegKind::Reg, true).unwrap();
        let y = b.add_register("y", RegKind::Reg, false).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![State::new(vec![
                Insn::new(1, add, &[a, a], &[x]),
                Insn::new(2, add, &[x, a], &[y]),
            ])],
        ))
        .unwrap();
        b.build()
    }

    #[test]
    fn reader_goes_first_on_a_shared_resource() {
        let (sched, dp) = schedule_table(&read_before_write(), 10, None).unwrap();
        let kinds = dp.edges().map(|(_, e)| e.kind).collect_vec();
        assert_eq!(kinds, vec![EdgeKind::ReadWrite]);
        assert_eq!(sched.state_of(InsnId(2)), Some(0));
        assert_eq!(sched.state_of(InsnId(1)), Some(1));
        assert_eq!(sched.num_states, 2);
    }

    #[test]
    fn nodes_downstream_of_a_transition_follow_it() {
        let mut b = TableBuilder::new("main");
        b.install_default_classes();
        let mul = b.add_resource_of("mul0", classes::MUL).unwrap();
        let set = b.add_resource_of("set0", classes::SET).unwrap();
        let tr = b.add_resource_of("tr0", classes::TRANSITION).unwrap();
        let a = b.add_register("a", RegKind::Reg, true).unwrap();
        let c = b.add_register("c", RegKind::Wire, false).unwrap();
        let d = b.add_register("d", RegKind::Wire, false).unwrap();
        let e = b.add_register("e", RegKind::Reg, false).unwrap();
        let p = b.add_register("p", RegKind::Reg, false).unwrap();
        let q = b.add_register("q", RegKind::Reg, false).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![State::new(vec![
                Insn::new(1, tr, &[a], &[c]),
                Insn::new(2, set, &[c], &[d]),
                Insn::new(3, set, &[d], &[e]),
                Insn::new(4, mul, &[a, a], &[p]),
                Insn::new(5, mul, &[a, a], &[q]),
            ])],
        ))
        .unwrap();
        let (sched, _) = schedule_table(&b.build(), 10, None).unwrap();
        assert_eq!(sched.state_of(InsnId(4)), Some(0));
        assert_eq!(sched.state_of(InsnId(5)), Some(1));
        for insn in 1..=3 {
            assert_eq!(sched.state_of(InsnId(insn)), Some(1));
        }
        assert_eq!(sched.num_states, 2);
    }

    /// A random block: `(state, resource, inputs, output)` per instruction.
    type InsnSpec = (usize, usize, Vec<usize>, usize);

    const NUM_REGS: usize = 6;

    fn random_table(specs: &[InsnSpec]) -> ir::Table {
        let mut b = TableBuilder::new("main");
        b.install_default_classes();
        let resources = [
            b.add_resource_of("add0", classes::ADD).unwrap(),
            b.add_resource_of("mul0", classes::MUL).unwrap(),
            b.add_resource_of("set0", classes::SET).unwrap(),
            b.add_resource_of("sel0", classes::SELECT).unwrap(),
        ];
        // Even registers are wires, odd ones are sequential.
        let regs = (0..NUM_REGS)
            .map(|i| {
                let kind = if i % 2 == 0 { RegKind::Wire } else { RegKind::Reg };
                b.add_register(format!("r{i}"), kind, true).unwrap()
            })
            .collect_vec();
        let num_states = specs.iter().map(|s| s.0 + 1).max().unwrap_or(1);
        let mut states = vec![State::default(); num_states];
        for (i, (st, res, inputs, output)) in specs.iter().enumerate() {
            // Wires are only read by writers of higher numbered registers.
            let inputs = inputs
                .iter()
                .filter(|r| *r % 2 == 1 || *r < output)
                .map(|r| regs[*r])
                .collect_vec();
            states[*st].insns.push(Insn::new(
                i as u32,
                resources[*res],
                &inputs,
                &[regs[*output]],
            ));
        }
        b.add_block(BasicBlock::new(0, states)).unwrap();
        b.build()
    }

    fn insn_spec() -> impl Strategy<Value = InsnSpec> {
        (
            0..3usize,
            0..4usize,
            prop::collection::vec(0..NUM_REGS, 0..3),
            0..NUM_REGS,
        )
    }

    proptest! {
        #[test]
        fn placements_respect_dependencies(
            specs in prop::collection::vec(insn_spec(), 1..10),
            max_delay in 1..8u32,
        ) {
            let table = random_table(&specs);
            let result = schedule_table(&table, max_delay, None);
            // Without a state limit, only a defective data path can fail.
            if let Err(e) = &result {
                prop_assert!(!e.is_recoverable(), "{}", e);
            }
            prop_assume!(result.is_ok());
            let (sched, dp) = result.unwrap();
            for (_, node) in dp.nodes() {
                prop_assert!(node.final_st_index() >= node.initial_st_index());
                for e in node.source_edges() {
                    let edge = dp.edge(*e);
                    let src = dp.node(edge.source);
                    match edge.kind {
                        EdgeKind::WriteRead if edge.state_local => {
                            prop_assert!(node.final_st_index() >= src.final_st_index())
                        }
                        EdgeKind::ReadWrite => {
                            prop_assert!(node.final_st_index() >= src.final_st_index())
                        }
                        _ => prop_assert!(node.final_st_index() > src.final_st_index()),
                    }
                }
            }
            for vres in dp.virtual_resources() {
                if !dp.node(dp.resource_nodes(vres)[0]).is_exclusive() {
                    continue;
                }
                let states = dp
                    .resource_nodes_by_state(vres)
                    .into_iter()
                    .map(|n| dp.node(n).final_st_index())
                    .collect_vec();
                prop_assert!(states.windows(2).all(|w| w[0] < w[1]));
            }
            prop_assert!(sched.insns.iter().all(|p| p.state < sched.num_states));
        }
    }
}
