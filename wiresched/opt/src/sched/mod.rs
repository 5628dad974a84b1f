//! Scheduling of whole tables.
mod bb_scheduler;
mod explorer;
mod schedule;
mod wire_plan;

pub use bb_scheduler::{BBScheduler, Placement};
pub use explorer::Explorer;
pub use schedule::{
    BlockFailure, BlockSchedule, InsnPlacement, ReplicaCount, TableSchedule,
};
pub use wire_plan::{
    PlanOutcome, ResourceEntry, WirePlan, WirePlanSet, mux_complexity,
};

use crate::analysis::{ConflictTracker, DataPathSet};
use crate::config::SchedConfig;
use std::collections::BTreeMap;
use wiresched_ir::{self as ir, DelayModel};
use wiresched_utils::Error;

/// Schedules produced under one wire plan.
#[derive(Debug)]
pub struct Evaluation {
    pub schedules: Vec<BlockSchedule>,
    pub failures: Vec<Error>,
    pub outcome: PlanOutcome,
}

/// Drives the wire plan search over a table and schedules every block under
/// the plan it settles on.
pub struct TableScheduler<'a> {
    table: &'a ir::Table,
    delay: &'a dyn DelayModel,
    config: SchedConfig,
}

impl<'a> TableScheduler<'a> {
    pub fn new(
        table: &'a ir::Table,
        delay: &'a dyn DelayModel,
        config: SchedConfig,
    ) -> Self {
        TableScheduler {
            table,
            delay,
            config,
        }
    }

    pub fn run(&self) -> TableSchedule {
        self.explore().0
    }

    /// Like [TableScheduler::run], also returning every plan that was
    /// evaluated.
    pub fn explore(&self) -> (TableSchedule, WirePlanSet) {
        let mut explorer = Explorer::new(self.table, self.config.explorer.clone());
        let mut evaluations: BTreeMap<usize, Evaluation> = BTreeMap::new();
        explorer.set_initial_allocation();
        while let Some(plan) = explorer.current_plan() {
            let id = plan.id();
            let eval = self.evaluate(plan);
            log::info!(
                "plan {id}: {} state(s), mux complexity {:.2}, {} infeasible block(s)",
                eval.outcome.total_states,
                eval.outcome.mux_complexity,
                eval.outcome.infeasible_blocks
            );
            explorer.record_outcome(id, eval.outcome.clone());
            evaluations.insert(id, eval);
            if !explorer.may_set_next_allocation_plan() {
                break;
            }
        }
        let plans = explorer.into_wire_plan_set();
        let eval = plans
            .accepted()
            .and_then(|p| evaluations.remove(&p.id()))
            .unwrap_or_else(|| self.evaluate(&WirePlan::default()));
        let schedule = self.table_schedule(&plans, eval);
        (schedule, plans)
    }

    /// Build the data paths of every block with instructions bound as in
    /// `plan`, annotated with delays.
    pub fn data_paths(&self, plan: &WirePlan) -> DataPathSet {
        let mut paths =
            DataPathSet::build(self.table, |res| plan.replicas_of(res));
        paths.set_delay(self.table, self.delay);
        paths
    }

    /// Schedule every block under `plan`.
    pub fn evaluate(&self, plan: &WirePlan) -> Evaluation {
        let mut paths = self.data_paths(plan);
        let mut failures = paths.failures().iter().cloned().collect::<Vec<_>>();
        let mut schedules = Vec::new();
        let (vrset, block_paths) = paths.parts_mut();
        for dp in block_paths.values_mut() {
            let mut tracker = ConflictTracker::default();
            let result =
                BBScheduler::new(dp, &mut tracker, vrset, self.delay.max_delay())
                    .with_max_states(self.config.max_states)
                    .schedule();
            match result {
                Ok(sched) => schedules.push(sched),
                Err(e) => {
                    log::debug!("{e}");
                    failures.push(e);
                }
            }
        }
        let total_states = schedules.iter().map(|s| s.num_states).sum();
        let infeasible = failures.iter().filter(|e| e.is_recoverable()).count();
        let outcome = PlanOutcome::measure(&paths, total_states, infeasible);
        failures.sort_by_key(|e| e.block());
        Evaluation {
            schedules,
            failures,
            outcome,
        }
    }

    fn table_schedule(&self, plans: &WirePlanSet, eval: Evaluation) -> TableSchedule {
        let plan = plans
            .entries()
            .map(|e| ReplicaCount {
                resource: e.name,
                replicas: plans.accepted().map_or(1, |p| p.replicas_of(e.resource)),
            })
            .collect();
        for err in &eval.failures {
            log::warn!("{err}");
        }
        TableSchedule {
            table: self.table.name,
            plan,
            iterations: plans.plans().len(),
            total_states: eval.outcome.total_states,
            mux_complexity: eval.outcome.mux_complexity,
            blocks: eval.schedules,
            failures: eval.failures.iter().map(BlockFailure::from).collect(),
        }
    }
}
