//! Data path graph of a basic block.
//!
//! ```text
//! ------------                     ------
//! |Node(Insn)|--Edge(Register)-->  |Node|
//! ------------                     ------
//! ```
//!
//! Nodes and edges live in arenas owned by [BBDataPath] and refer to each
//! other by index, so the graph can be walked in both directions without
//! shared ownership.
use super::{VirtualResourceSet, VresIdx};
use itertools::Itertools;
use petgraph::{algo, graphmap::DiGraphMap};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use wiresched_ir::{self as ir, BbId, DelayModel, InsnId, RegIdx};
use wiresched_utils::{Error, IndexedMap, MultiError, SchedResult, impl_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(u32);
impl_index!(NodeIdx);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdx(u32);
impl_index!(EdgeIdx);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// The sink redefines a register the source wrote.
    WriteWrite,
    /// The sink reads a value the source produced.
    WriteRead,
    /// The sink overwrites a register the source reads.
    ReadWrite,
}

impl Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeKind::WriteWrite => write!(f, "W->W"),
            EdgeKind::WriteRead => write!(f, "W->R"),
            EdgeKind::ReadWrite => write!(f, "R->W"),
        }
    }
}

/// A register flowing from its source instruction to a sink.
#[derive(Debug, Clone)]
pub struct PathEdge {
    pub kind: EdgeKind,
    pub source: NodeIdx,
    pub sink: NodeIdx,
    /// Index of the register in the source's outputs, or in its inputs for
    /// [EdgeKind::ReadWrite] edges.
    pub reg_index: usize,
    pub reg: RegIdx,
    /// The register is a combinational wire.
    pub state_local: bool,
}

impl PathEdge {
    pub fn is_w_to_r(&self) -> bool {
        self.kind == EdgeKind::WriteRead
    }
}

/// An instruction and its scheduling state.
#[derive(Debug, Clone)]
pub struct PathNode {
    insn: InsnId,
    initial_st_index: usize,
    final_st_index: usize,
    vres: VresIdx,
    exclusive: bool,
    transition: bool,
    node_delay: u32,
    accumulated_delay: Option<u32>,
    /// Accumulated delay within the state the node is placed in. Scratch
    /// value owned by the scheduler.
    pub(crate) state_local_delay: u32,
    /// Edges from nodes this one depends on.
    pub(crate) source_edges: SmallVec<[EdgeIdx; 4]>,
    /// Edges to nodes that depend on this one.
    pub(crate) sink_edges: SmallVec<[EdgeIdx; 4]>,
}

impl PathNode {
    pub fn id(&self) -> InsnId {
        self.insn
    }

    pub fn initial_st_index(&self) -> usize {
        self.initial_st_index
    }

    pub fn final_st_index(&self) -> usize {
        self.final_st_index
    }

    pub(crate) fn set_final_st_index(&mut self, st_index: usize) {
        self.final_st_index = st_index;
    }

    pub fn virtual_resource(&self) -> VresIdx {
        self.vres
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    pub fn is_transition(&self) -> bool {
        self.transition
    }

    pub fn node_delay(&self) -> u32 {
        self.node_delay
    }

    /// Worst-case delay of any path of W->R edges ending at this node. The
    /// path follows sequential W->R edges too, so it may cross state
    /// boundaries. Zero until [BBDataPath::set_delay] has run.
    pub fn accumulated_delay_from_leaf(&self) -> u32 {
        self.accumulated_delay.unwrap_or(0)
    }

    pub fn state_local_delay(&self) -> u32 {
        self.state_local_delay
    }

    pub fn source_edges(&self) -> &[EdgeIdx] {
        &self.source_edges
    }

    pub fn sink_edges(&self) -> &[EdgeIdx] {
        &self.sink_edges
    }
}

/// Data path graph for one basic block.
#[derive(Debug, Clone)]
pub struct BBDataPath {
    bb: BbId,
    num_states: usize,
    nodes: IndexedMap<NodeIdx, PathNode>,
    edges: IndexedMap<EdgeIdx, PathEdge>,
    by_insn: HashMap<InsnId, NodeIdx>,
    /// Nodes bound to each virtual resource, in program order.
    resource_nodes: BTreeMap<VresIdx, Vec<NodeIdx>>,
}

impl BBDataPath {
    /// Build the graph of `bb` with instructions bound as in `vrset`.
    pub fn build(
        table: &ir::Table,
        bb: &ir::BasicBlock,
        vrset: &VirtualResourceSet,
    ) -> SchedResult<Self> {
        let mut dp = BBDataPath {
            bb: bb.id,
            num_states: bb.states.len(),
            nodes: IndexedMap::new(),
            edges: IndexedMap::new(),
            by_insn: HashMap::new(),
            resource_nodes: BTreeMap::new(),
        };
        for (st_index, insn) in bb.insns() {
            let vres = vrset.vres_of(insn.id).ok_or_else(|| {
                Error::misc(format!(
                    "instruction {} is not bound to a virtual resource",
                    insn.id
                ))
                .in_block(bb.id)
            })?;
            let v = vrset.get(vres);
            let idx = dp.nodes.push(PathNode {
                insn: insn.id,
                initial_st_index: st_index,
                final_st_index: st_index,
                vres,
                exclusive: v.exclusive,
                transition: v.transition,
                node_delay: 0,
                accumulated_delay: None,
                state_local_delay: 0,
                source_edges: SmallVec::new(),
                sink_edges: SmallVec::new(),
            });
            dp.by_insn.insert(insn.id, idx);
            dp.resource_nodes.entry(vres).or_default().push(idx);
        }
        dp.build_edges(table, bb)?;
        log::debug!(
            "{}: {} node(s), {} edge(s)",
            dp.bb,
            dp.nodes.len(),
            dp.edges.len()
        );
        Ok(dp)
    }

    fn build_edges(
        &mut self,
        table: &ir::Table,
        bb: &ir::BasicBlock,
    ) -> SchedResult<()> {
        // Register to the instruction that last wrote it and the index of
        // the register in that instruction's outputs.
        let mut owners: HashMap<RegIdx, (NodeIdx, usize)> = HashMap::new();
        // Readers of each sequential register since it was last written.
        let mut readers: HashMap<RegIdx, Vec<(NodeIdx, usize)>> =
            HashMap::new();

        for state in &bb.states {
            let insns = state
                .insns
                .iter()
                .map(|insn| (self.by_insn[&insn.id], insn))
                .collect_vec();

            // State local outputs are visible to every reader in this state.
            for (node, insn) in &insns {
                for (oindex, reg) in insn.outputs.iter().enumerate() {
                    if table.register(*reg).is_state_local() {
                        owners.insert(*reg, (*node, oindex));
                    }
                }
            }

            // W->R
            for (node, insn) in &insns {
                for (iindex, reg) in insn.inputs.iter().enumerate() {
                    let register = table.register(*reg);
                    match owners.get(reg) {
                        Some(&(src, oindex)) => self.build_edge(
                            EdgeKind::WriteRead,
                            src,
                            *node,
                            oindex,
                            *reg,
                            register.is_state_local(),
                        ),
                        None if register.is_initialized() => (),
                        None => {
                            return Err(Error::dangling_read(
                                insn.id.into(),
                                register.name,
                            )
                            .in_block(bb.id));
                        }
                    }
                    if !register.is_state_local() {
                        let rs = readers.entry(*reg).or_default();
                        if !rs.iter().any(|(n, _)| n == node) {
                            rs.push((*node, iindex));
                        }
                    }
                }
            }

            // W->W, R->W
            for (node, insn) in &insns {
                for reg in insn.outputs.iter() {
                    let register = table.register(*reg);
                    if let Some(&(src, oindex)) = owners.get(reg) {
                        if src != *node {
                            self.build_edge(
                                EdgeKind::WriteWrite,
                                src,
                                *node,
                                oindex,
                                *reg,
                                register.is_state_local(),
                            );
                        }
                    }
                    if register.is_state_local() {
                        continue;
                    }
                    for &(reader, iindex) in
                        readers.get(reg).map(Vec::as_slice).unwrap_or(&[])
                    {
                        // A reader that consumes a value of this writer has to
                        // stay in its state anyway.
                        if reader == *node || self.has_edge(*node, reader) {
                            continue;
                        }
                        self.build_edge(
                            EdgeKind::ReadWrite,
                            reader,
                            *node,
                            iindex,
                            *reg,
                            false,
                        );
                    }
                }
            }

            // Sequential outputs become visible from the next state on, wires
            // are gone.
            for (node, insn) in &insns {
                for (oindex, reg) in insn.outputs.iter().enumerate() {
                    if table.register(*reg).is_state_local() {
                        owners.remove(reg);
                    } else {
                        owners.insert(*reg, (*node, oindex));
                        readers.remove(reg);
                    }
                }
            }
        }
        Ok(())
    }

    fn build_edge(
        &mut self,
        kind: EdgeKind,
        source: NodeIdx,
        sink: NodeIdx,
        reg_index: usize,
        reg: RegIdx,
        state_local: bool,
    ) {
        // Edge ids follow creation order across the whole block.
        let edge = self.edges.push(PathEdge {
            kind,
            source,
            sink,
            reg_index,
            reg,
            state_local,
        });
        self.nodes[sink].source_edges.push(edge);
        self.nodes[source].sink_edges.push(edge);
    }

    fn has_edge(&self, source: NodeIdx, sink: NodeIdx) -> bool {
        self.nodes[source]
            .sink_edges
            .iter()
            .any(|e| self.edges[*e].sink == sink)
    }

    /// Report a dependency cycle, if there is one.
    pub fn check_acyclic(&self) -> SchedResult<()> {
        let mut graph: DiGraphMap<NodeIdx, ()> = DiGraphMap::new();
        for n in self.nodes.keys() {
            graph.add_node(n);
        }
        for edge in self.edges.values() {
            graph.add_edge(edge.source, edge.sink, ());
        }
        algo::toposort(&graph, None).map(|_| ()).map_err(|cycle| {
            Error::cyclic_dependency(self.nodes[cycle.node_id()].insn.into())
                .in_block(self.bb)
                .with_post_msg(Some(self.to_string()))
        })
    }

    /// Annotate every node with its own delay and its accumulated delay from
    /// the leaves of the graph.
    pub fn set_delay(
        &mut self,
        table: &ir::Table,
        dinfo: &dyn DelayModel,
    ) -> SchedResult<()> {
        let order = self.nodes.keys().collect_vec();
        self.set_delay_in_order(table, dinfo, order)
    }

    /// Same as [BBDataPath::set_delay], resolving nodes in the given order.
    /// The result does not depend on the order.
    pub fn set_delay_in_order<I>(
        &mut self,
        table: &ir::Table,
        dinfo: &dyn DelayModel,
        order: I,
    ) -> SchedResult<()>
    where
        I: IntoIterator<Item = NodeIdx>,
    {
        let block = table.block(self.bb).ok_or_else(|| {
            Error::misc("data path refers to a missing block").in_block(self.bb)
        })?;
        let delays: HashMap<InsnId, u32> = block
            .insns()
            .map(|(_, insn)| (insn.id, dinfo.delay_of(table, insn)))
            .collect();
        for node in self.nodes.values_mut() {
            node.accumulated_delay = None;
            node.node_delay = delays.get(&node.insn).copied().unwrap_or(0);
        }
        self.check_acyclic()?;

        let mut stack: Vec<NodeIdx> = Vec::new();
        for start in order {
            stack.push(start);
            while let Some(&n) = stack.last() {
                if self.nodes[n].accumulated_delay.is_some() {
                    stack.pop();
                    continue;
                }
                let pending = self
                    .w_to_r_sources(n)
                    .filter(|src| self.nodes[*src].accumulated_delay.is_none())
                    .collect::<SmallVec<[NodeIdx; 4]>>();
                if pending.is_empty() {
                    let max_source_delay = self
                        .w_to_r_sources(n)
                        .map(|src| self.nodes[src].accumulated_delay_from_leaf())
                        .max()
                        .unwrap_or(0);
                    let node = &mut self.nodes[n];
                    node.accumulated_delay =
                        Some(max_source_delay.saturating_add(node.node_delay));
                    stack.pop();
                } else {
                    stack.extend(pending);
                }
            }
        }
        Ok(())
    }

    /// Nodes that produce a value `n` reads.
    pub fn w_to_r_sources(
        &self,
        n: NodeIdx,
    ) -> impl Iterator<Item = NodeIdx> + '_ {
        self.nodes[n]
            .source_edges
            .iter()
            .map(|e| &self.edges[*e])
            .filter(|e| e.is_w_to_r())
            .map(|e| e.source)
    }

    pub fn bb(&self) -> BbId {
        self.bb
    }

    /// Number of states of the block before scheduling.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &PathNode)> {
        self.nodes.iter()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, idx: NodeIdx) -> &PathNode {
        &self.nodes[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut PathNode {
        &mut self.nodes[idx]
    }

    pub fn node_of(&self, insn: InsnId) -> Option<NodeIdx> {
        self.by_insn.get(&insn).copied()
    }

    pub fn edge(&self, idx: EdgeIdx) -> &PathEdge {
        &self.edges[idx]
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeIdx, &PathEdge)> {
        self.edges.iter()
    }

    /// Virtual resources used in this block.
    pub fn virtual_resources(&self) -> impl Iterator<Item = VresIdx> + '_ {
        self.resource_nodes.keys().copied()
    }

    /// Nodes bound to `vres` in program order.
    pub fn resource_nodes(&self, vres: VresIdx) -> &[NodeIdx] {
        self.resource_nodes
            .get(&vres)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Nodes bound to `vres` ordered by their final state index.
    pub fn resource_nodes_by_state(&self, vres: VresIdx) -> Vec<NodeIdx> {
        self.resource_nodes(vres)
            .iter()
            .copied()
            .sorted_by_key(|n| (self.nodes[*n].final_st_index, *n))
            .collect()
    }
}

impl Display for BBDataPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DataPath {}:", self.bb)?;
        for node in self.nodes.values() {
            write!(
                f,
                "  Node {}@{} -> {} delay={} acc={}",
                node.insn,
                node.initial_st_index,
                node.final_st_index,
                node.node_delay,
                node.accumulated_delay_from_leaf()
            )?;
            if !node.source_edges.is_empty() {
                let sources = node
                    .source_edges
                    .iter()
                    .map(|e| {
                        let edge = &self.edges[*e];
                        format!("{}({})", self.nodes[edge.source].insn, edge.kind)
                    })
                    .join(" ");
                write!(f, " <- {sources}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Data paths of every block of a table, built against one virtual resource
/// binding. Blocks whose graph is defective are kept as errors so that the
/// remaining blocks can still be scheduled.
#[derive(Debug, Default)]
pub struct DataPathSet {
    vrset: VirtualResourceSet,
    paths: BTreeMap<BbId, BBDataPath>,
    failures: MultiError,
}

impl DataPathSet {
    /// Bind instructions with `replicas_of` replicas per resource and build
    /// the data path of every block.
    pub fn build<F>(table: &ir::Table, replicas_of: F) -> Self
    where
        F: Fn(ir::ResourceIdx) -> u32,
    {
        let mut set = DataPathSet::default();
        set.vrset.build_binding(table, replicas_of);
        for bb in table.blocks() {
            match BBDataPath::build(table, bb, &set.vrset) {
                Ok(dp) => {
                    set.paths.insert(bb.id, dp);
                }
                Err(e) => {
                    log::debug!("{e}");
                    set.failures.push(e);
                }
            }
        }
        set
    }

    /// Annotate every path with delays. Paths with a dependency cycle are
    /// moved to the failures.
    pub fn set_delay(&mut self, table: &ir::Table, dinfo: &dyn DelayModel) {
        let mut cyclic = Vec::new();
        for (bb, dp) in self.paths.iter_mut() {
            if let Err(e) = dp.set_delay(table, dinfo) {
                log::debug!("{e}");
                cyclic.push(*bb);
                self.failures.push(e);
            }
        }
        for bb in cyclic {
            self.paths.remove(&bb);
        }
    }

    pub fn paths(&self) -> &BTreeMap<BbId, BBDataPath> {
        &self.paths
    }

    /// The binding together with mutable access to the paths built on it.
    pub fn parts_mut(
        &mut self,
    ) -> (&VirtualResourceSet, &mut BTreeMap<BbId, BBDataPath>) {
        (&self.vrset, &mut self.paths)
    }

    pub fn failures(&self) -> &MultiError {
        &self.failures
    }

    pub fn virtual_resource_set(&self) -> &VirtualResourceSet {
        &self.vrset
    }
}

impl Display for DataPathSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for dp in self.paths.values() {
            write!(f, "{dp}")?;
        }
        for err in self.failures.iter() {
            writeln!(f, "{err}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wiresched_ir::{
        BasicBlock, DelayInfo, Insn, RegKind, ResourceParams, State,
        TableBuilder,
    };
    use wiresched_utils::ErrorKind;

    /// Resources `op{d}` for delays 0..=5, all shareable.
    fn builder() -> TableBuilder {
        let mut b = TableBuilder::new("main");
        b.install_default_classes();
        let class = b.add_class("op", false, false).unwrap();
        for d in 0..=5 {
            let params: ResourceParams =
                [(ResourceParams::DELAY, d)].into_iter().collect();
            b.add_resource(format!("op{d}"), class, params).unwrap();
        }
        b
    }

    fn build_one(table: &ir::Table) -> SchedResult<BBDataPath> {
        let mut vrs = VirtualResourceSet::default();
        vrs.build_default_binding(table);
        BBDataPath::build(table, &table.blocks()[0], &vrs)
    }

    fn edge_kinds(dp: &BBDataPath) -> Vec<(u32, u32, EdgeKind)> {
        dp.edges()
            .map(|(_, e)| {
                (dp.node(e.source).id().0, dp.node(e.sink).id().0, e.kind)
            })
            .collect()
    }

    #[test]
    fn state_local_and_sequential_edges() {
        let mut b = builder();
        let op = b.resource("op1").unwrap();
        let a = b.add_register("a", RegKind::Reg, true).unwrap();
        let w = b.add_register("w", RegKind::Wire, false).unwrap();
        let r = b.add_register("r", RegKind::Reg, false).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![
                State::new(vec![
                    // Reads the wire before it is written in program order.
                    Insn::new(2, op, &[w], &[r]),
                    Insn::new(1, op, &[a], &[w]),
                ]),
                State::new(vec![
                    Insn::new(3, op, &[r], &[a]),
                    Insn::new(4, op, &[], &[r]),
                ]),
            ],
        ))
        .unwrap();
        let table = b.build();
        let dp = build_one(&table).unwrap();
        assert_eq!(
            edge_kinds(&dp),
            vec![
                (1, 2, EdgeKind::WriteRead),
                (2, 3, EdgeKind::WriteRead),
                (1, 3, EdgeKind::ReadWrite),
                (2, 4, EdgeKind::WriteWrite),
                (3, 4, EdgeKind::ReadWrite),
            ]
        );
        let e = dp.edges().next().unwrap().1;
        assert!(e.state_local);
        assert_eq!(e.reg_index, 0);
    }

    #[test]
    fn dangling_read_is_reported() {
        let mut b = builder();
        let op = b.resource("op1").unwrap();
        let r = b.add_register("r", RegKind::Reg, false).unwrap();
        let s = b.add_register("s", RegKind::Reg, false).unwrap();
        b.add_block(BasicBlock::new(
            4,
            vec![State::new(vec![Insn::new(1, op, &[r], &[s])])],
        ))
        .unwrap();
        let table = b.build();
        let err = build_one(&table).unwrap_err();
        assert_eq!(err.block(), Some(4));
        assert!(matches!(
            err.kind(),
            ErrorKind::DanglingRead { insn: 1, reg } if *reg == "r"
        ));
    }

    #[test]
    fn constants_are_never_dangling() {
        let mut b = builder();
        let op = b.resource("op1").unwrap();
        let c = b.add_register("c", RegKind::Const, false).unwrap();
        let s = b.add_register("s", RegKind::Reg, false).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![State::new(vec![Insn::new(1, op, &[c], &[s])])],
        ))
        .unwrap();
        let table = b.build();
        assert_eq!(build_one(&table).unwrap().edges().count(), 0);
    }

    #[test]
    fn combinational_loop_is_a_cycle() {
        let mut b = builder();
        let op = b.resource("op1").unwrap();
        let w0 = b.add_register("w0", RegKind::Wire, false).unwrap();
        let w1 = b.add_register("w1", RegKind::Wire, false).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![State::new(vec![
                Insn::new(1, op, &[w1], &[w0]),
                Insn::new(2, op, &[w0], &[w1]),
            ])],
        ))
        .unwrap();
        let table = b.build();
        let mut dp = build_one(&table).unwrap();
        let err = dp.set_delay(&table, &DelayInfo::new(10)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::CyclicDependency { .. }));
    }

    /// A diamond of wires: 1 -> {2, 3} -> 4, plus a sequential tail 5.
    fn diamond() -> ir::Table {
        let mut b = builder();
        let ops = (0..=5)
            .map(|d| b.resource(&format!("op{d}")).unwrap())
            .collect_vec();
        let a = b.add_register("a", RegKind::Reg, true).unwrap();
        let w = (0..4)
            .map(|i| b.add_register(format!("w{i}"), RegKind::Wire, false))
            .collect::<SchedResult<Vec<_>>>()
            .unwrap();
        let r = b.add_register("r", RegKind::Reg, false).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![
                State::new(vec![
                    Insn::new(1, ops[2], &[a], &[w[0]]),
                    Insn::new(2, ops[3], &[w[0]], &[w[1]]),
                    Insn::new(3, ops[1], &[w[0]], &[w[2]]),
                    Insn::new(4, ops[4], &[w[1], w[2]], &[r]),
                ]),
                State::new(vec![Insn::new(5, ops[5], &[r], &[w[3]])]),
            ],
        ))
        .unwrap();
        b.build()
    }

    #[test]
    fn accumulated_delay_from_leaf() {
        let table = diamond();
        let mut dp = build_one(&table).unwrap();
        dp.set_delay(&table, &DelayInfo::new(10)).unwrap();
        let acc = (1..=5)
            .map(|i| {
                let n = dp.node_of(InsnId(i)).unwrap();
                dp.node(n).accumulated_delay_from_leaf()
            })
            .collect_vec();
        assert_eq!(acc, vec![2, 5, 3, 9, 14]);
    }

    proptest! {
        #[test]
        fn delay_is_order_independent(
            order in Just((0..5usize).collect_vec()).prop_shuffle()
        ) {
            let table = diamond();
            let mut expected = build_one(&table).unwrap();
            expected.set_delay(&table, &DelayInfo::new(10)).unwrap();
            let mut dp = build_one(&table).unwrap();
            dp.set_delay_in_order(
                &table,
                &DelayInfo::new(10),
                order.into_iter().map(NodeIdx::from),
            ).unwrap();
            for (n, node) in dp.nodes() {
                prop_assert_eq!(
                    node.accumulated_delay_from_leaf(),
                    expected.node(n).accumulated_delay_from_leaf()
                );
            }
        }
    }

    #[test]
    fn data_path_set_keeps_going_after_a_defect() {
        let mut b = builder();
        let op = b.resource("op1").unwrap();
        let r = b.add_register("r", RegKind::Reg, false).unwrap();
        let s = b.add_register("s", RegKind::Reg, true).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![State::new(vec![Insn::new(1, op, &[r], &[s])])],
        ))
        .unwrap();
        b.add_block(BasicBlock::new(
            1,
            vec![State::new(vec![Insn::new(2, op, &[s], &[r])])],
        ))
        .unwrap();
        let table = b.build();
        let mut set = DataPathSet::build(&table, |_| 1);
        set.set_delay(&table, &DelayInfo::new(10));
        assert_eq!(set.paths().keys().copied().collect_vec(), vec![BbId(1)]);
        assert_eq!(set.failures().len(), 1);
        assert_eq!(set.failures().iter().next().unwrap().block(), Some(0));
        assert!(set.to_string().contains("DataPath bb1"));
    }
}
