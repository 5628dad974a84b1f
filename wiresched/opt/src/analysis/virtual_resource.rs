use std::collections::HashMap;
use wiresched_ir::{self as ir, ClassIdx, InsnId, ResourceIdx};
use wiresched_utils::{Id, IndexedMap, impl_index};

/// Index of a [VirtualResource] in its [VirtualResourceSet].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VresIdx(u32);
impl_index!(VresIdx);

/// One physical instance of a resource. A resource replicated `n` times by a
/// wire plan has `n` virtual resources, one per replica.
#[derive(Debug, Clone)]
pub struct VirtualResource {
    pub resource: ResourceIdx,
    /// Name of the underlying resource.
    pub name: Id,
    pub class: ClassIdx,
    pub replica: u32,
    pub exclusive: bool,
    pub transition: bool,
}

/// Binding of every instruction of a table to a virtual resource.
#[derive(Debug, Default)]
pub struct VirtualResourceSet {
    vres: IndexedMap<VresIdx, VirtualResource>,
    index: HashMap<(ResourceIdx, u32), VresIdx>,
    by_insn: HashMap<InsnId, VresIdx>,
}

impl VirtualResourceSet {
    /// Bind every instruction to the single replica of its resource.
    pub fn build_default_binding(&mut self, table: &ir::Table) {
        self.build_binding(table, |_| 1)
    }

    /// Bind instructions to replicas. The n-th use of an exclusive resource
    /// in the table (blocks in order, then program order) goes to replica
    /// `n mod replicas_of(resource)`. Shareable resources only ever have
    /// replica 0.
    pub fn build_binding<F>(&mut self, table: &ir::Table, replicas_of: F)
    where
        F: Fn(ResourceIdx) -> u32,
    {
        self.vres = IndexedMap::new();
        self.index.clear();
        self.by_insn.clear();
        let mut uses: HashMap<ResourceIdx, u32> = HashMap::new();
        for bb in table.blocks() {
            for (_, insn) in bb.insns() {
                let replica = if table.is_exclusive(insn.resource) {
                    let count = uses.entry(insn.resource).or_insert(0);
                    let replica = *count % replicas_of(insn.resource).max(1);
                    *count += 1;
                    replica
                } else {
                    0
                };
                let vres = self.get_or_create(table, insn.resource, replica);
                self.by_insn.insert(insn.id, vres);
            }
        }
        log::debug!(
            "bound {} instruction(s) to {} virtual resource(s)",
            self.by_insn.len(),
            self.vres.len()
        );
    }

    fn get_or_create(
        &mut self,
        table: &ir::Table,
        resource: ResourceIdx,
        replica: u32,
    ) -> VresIdx {
        if let Some(idx) = self.index.get(&(resource, replica)) {
            return *idx;
        }
        let res = table.resource(resource);
        let class = table.class(res.class);
        let idx = self.vres.push(VirtualResource {
            resource,
            name: res.name,
            class: res.class,
            replica,
            exclusive: class.exclusive,
            transition: class.transition,
        });
        self.index.insert((resource, replica), idx);
        idx
    }

    pub fn vres_of(&self, insn: InsnId) -> Option<VresIdx> {
        self.by_insn.get(&insn).copied()
    }

    pub fn get(&self, idx: VresIdx) -> &VirtualResource {
        &self.vres[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = (VresIdx, &VirtualResource)> {
        self.vres.iter()
    }

    pub fn len(&self) -> usize {
        self.vres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vres.is_empty()
    }
}
