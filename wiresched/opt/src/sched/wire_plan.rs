//! Wire plans: how many replicas of each shared resource to instantiate.
use crate::analysis::DataPathSet;
use linked_hash_map::LinkedHashMap;
use std::collections::BTreeMap;
use wiresched_ir::{self as ir, ResourceIdx};
use wiresched_utils::Id;

/// An exclusive resource used at least once in the table.
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    pub resource: ResourceIdx,
    pub name: Id,
    /// Number of instructions bound to the resource across all blocks.
    pub uses: usize,
}

/// What scheduling under a plan produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanOutcome {
    /// Sum of the number of states of every scheduled block.
    pub total_states: usize,
    pub mux_complexity: f64,
    /// Number of instructions bound to each replica of each resource.
    pub replica_usage: BTreeMap<ResourceIdx, Vec<usize>>,
    /// Blocks that could not be scheduled under the plan.
    pub infeasible_blocks: usize,
}

impl PlanOutcome {
    /// Measure the binding of `paths`. Only exclusive resources are counted.
    pub fn measure(
        paths: &DataPathSet,
        total_states: usize,
        infeasible_blocks: usize,
    ) -> Self {
        let vrset = paths.virtual_resource_set();
        let mut replica_usage: BTreeMap<ResourceIdx, Vec<usize>> =
            BTreeMap::new();
        for dp in paths.paths().values() {
            for vres in dp.virtual_resources() {
                let v = vrset.get(vres);
                if !v.exclusive {
                    continue;
                }
                let usage = replica_usage.entry(v.resource).or_default();
                let replica = v.replica as usize;
                if usage.len() <= replica {
                    usage.resize(replica + 1, 0);
                }
                usage[replica] += dp.resource_nodes(vres).len();
            }
        }
        let mux_complexity =
            mux_complexity(replica_usage.values().flatten().copied());
        PlanOutcome {
            total_states,
            mux_complexity,
            replica_usage,
            infeasible_blocks,
        }
    }
}

/// Estimated multiplexer cost of a binding: a replica shared by `f`
/// instructions needs an `f`-input mux in front of each port, costing
/// `f * log2(f)`.
pub fn mux_complexity<I>(fan_in: I) -> f64
where
    I: IntoIterator<Item = usize>,
{
    fan_in
        .into_iter()
        .filter(|f| *f > 1)
        .map(|f| {
            let f = f as f64;
            f * f.log2()
        })
        .sum()
}

#[derive(Debug, Clone, Default)]
pub struct WirePlan {
    id: usize,
    replicas: BTreeMap<ResourceIdx, u32>,
    outcome: Option<PlanOutcome>,
}

impl WirePlan {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Replicas of `res`. Resources the plan does not mention have one.
    pub fn replicas_of(&self, res: ResourceIdx) -> u32 {
        self.replicas.get(&res).copied().unwrap_or(1)
    }

    pub fn set_replicas(&mut self, res: ResourceIdx, replicas: u32) {
        self.replicas.insert(res, replicas.max(1));
    }

    /// Uses of the entry per replica under this plan: the largest number of
    /// instructions bound to one replica once the plan has been evaluated,
    /// the average before that.
    pub fn usage_rate(&self, entry: &ResourceEntry) -> f64 {
        let measured = self
            .outcome
            .as_ref()
            .and_then(|o| o.replica_usage.get(&entry.resource))
            .and_then(|usage| usage.iter().max());
        match measured {
            Some(max) => *max as f64,
            None => entry.uses as f64 / self.replicas_of(entry.resource) as f64,
        }
    }

    pub fn outcome(&self) -> Option<&PlanOutcome> {
        self.outcome.as_ref()
    }

    pub fn set_outcome(&mut self, outcome: PlanOutcome) {
        self.outcome = Some(outcome);
    }
}

/// Every plan evaluated for a table, and the one currently accepted.
#[derive(Debug, Default)]
pub struct WirePlanSet {
    entries: LinkedHashMap<ResourceIdx, ResourceEntry>,
    plans: Vec<WirePlan>,
    accepted: Option<usize>,
}

impl WirePlanSet {
    pub fn new(table: &ir::Table) -> Self {
        let mut entries: LinkedHashMap<ResourceIdx, ResourceEntry> =
            LinkedHashMap::new();
        for bb in table.blocks() {
            for (_, insn) in bb.insns() {
                if !table.is_exclusive(insn.resource) {
                    continue;
                }
                entries
                    .entry(insn.resource)
                    .or_insert_with(|| ResourceEntry {
                        resource: insn.resource,
                        name: table.resource(insn.resource).name,
                        uses: 0,
                    })
                    .uses += 1;
            }
        }
        WirePlanSet {
            entries,
            plans: Vec::new(),
            accepted: None,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.values()
    }

    pub fn entry(&self, res: ResourceIdx) -> Option<&ResourceEntry> {
        self.entries.get(&res)
    }

    /// Add a plan with the given replica counts and return its id.
    pub fn add_plan(&mut self, replicas: BTreeMap<ResourceIdx, u32>) -> usize {
        let id = self.plans.len();
        let mut plan = WirePlan {
            id,
            ..Default::default()
        };
        for (res, n) in replicas {
            plan.set_replicas(res, n);
        }
        self.plans.push(plan);
        id
    }

    pub fn plan(&self, id: usize) -> Option<&WirePlan> {
        self.plans.get(id)
    }

    pub fn plan_mut(&mut self, id: usize) -> Option<&mut WirePlan> {
        self.plans.get_mut(id)
    }

    pub fn plans(&self) -> &[WirePlan] {
        &self.plans
    }

    pub fn latest(&self) -> Option<&WirePlan> {
        self.plans.last()
    }

    pub fn accepted(&self) -> Option<&WirePlan> {
        self.accepted.and_then(|id| self.plans.get(id))
    }

    pub fn set_accepted(&mut self, id: usize) {
        self.accepted = Some(id);
    }
}
