use crate::{
    ClassIdx, RegIdx, Register, Resource, ResourceClass, ResourceIdx,
};
use serde::Serialize;
use smallvec::SmallVec;
use wiresched_utils::{GetName, Id, IndexRef, IndexedMap};

/// Identifier of an instruction. Unique within its [Table].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(transparent)]
pub struct InsnId(pub u32);

/// Identifier of a basic block. Unique within its [Table].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
)]
#[serde(transparent)]
pub struct BbId(pub u32);

impl From<InsnId> for u32 {
    fn from(id: InsnId) -> Self {
        id.0
    }
}

impl From<BbId> for u32 {
    fn from(id: BbId) -> Self {
        id.0
    }
}

impl std::fmt::Display for InsnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for BbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// An operation bound to a resource. Reads `inputs` and writes `outputs`.
#[derive(Debug, Clone)]
pub struct Insn {
    pub id: InsnId,
    pub resource: ResourceIdx,
    pub inputs: SmallVec<[RegIdx; 2]>,
    pub outputs: SmallVec<[RegIdx; 1]>,
}

impl Insn {
    pub fn new(
        id: u32,
        resource: ResourceIdx,
        inputs: &[RegIdx],
        outputs: &[RegIdx],
    ) -> Self {
        Insn {
            id: InsnId(id),
            resource,
            inputs: inputs.into(),
            outputs: outputs.into(),
        }
    }
}

/// One clock cycle of the finite-state machine.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub insns: Vec<Insn>,
}

impl State {
    pub fn new(insns: Vec<Insn>) -> Self {
        State { insns }
    }
}

/// A straight-line sequence of states with a single entry and exit.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BbId,
    pub states: Vec<State>,
}

impl BasicBlock {
    pub fn new(id: u32, states: Vec<State>) -> Self {
        BasicBlock {
            id: BbId(id),
            states,
        }
    }

    /// All instructions of the block with the index of the state they are in.
    pub fn insns(&self) -> impl Iterator<Item = (usize, &Insn)> {
        self.states
            .iter()
            .enumerate()
            .flat_map(|(st, state)| state.insns.iter().map(move |i| (st, i)))
    }
}

/// A finite-state machine: the resources and registers it uses and the basic
/// blocks that make up its states. Built through a
/// [TableBuilder](crate::TableBuilder).
#[derive(Debug, Clone)]
pub struct Table {
    pub name: Id,
    pub(crate) classes: IndexedMap<ClassIdx, ResourceClass>,
    pub(crate) resources: IndexedMap<ResourceIdx, Resource>,
    pub(crate) registers: IndexedMap<RegIdx, Register>,
    pub(crate) blocks: Vec<BasicBlock>,
}

impl Table {
    pub fn class(&self, idx: ClassIdx) -> &ResourceClass {
        &self.classes[idx]
    }

    pub fn resource(&self, idx: ResourceIdx) -> &Resource {
        &self.resources[idx]
    }

    pub fn register(&self, idx: RegIdx) -> &Register {
        &self.registers[idx]
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassIdx, &ResourceClass)> {
        self.classes.iter()
    }

    pub fn resources(&self) -> impl Iterator<Item = (ResourceIdx, &Resource)> {
        self.resources.iter()
    }

    pub fn registers(&self) -> impl Iterator<Item = (RegIdx, &Register)> {
        self.registers.iter()
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn block(&self, id: crate::BbId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|bb| bb.id == id)
    }

    /// The class of the given resource.
    pub fn class_of(&self, res: ResourceIdx) -> &ResourceClass {
        self.class(self.resource(res).class)
    }

    pub fn is_exclusive(&self, res: ResourceIdx) -> bool {
        self.class_of(res).exclusive
    }

    pub fn is_transition(&self, res: ResourceIdx) -> bool {
        self.class_of(res).transition
    }

    pub fn find_class(&self, name: &str) -> Option<ClassIdx> {
        find_by_name(&self.classes, name)
    }

    pub fn find_resource(&self, name: &str) -> Option<ResourceIdx> {
        find_by_name(&self.resources, name)
    }

    pub fn find_register(&self, name: &str) -> Option<RegIdx> {
        find_by_name(&self.registers, name)
    }
}

fn find_by_name<K: IndexRef, T: GetName>(
    items: &IndexedMap<K, T>,
    name: &str,
) -> Option<K> {
    items
        .iter()
        .find_map(|(idx, item)| (item.name() == name).then_some(idx))
}
