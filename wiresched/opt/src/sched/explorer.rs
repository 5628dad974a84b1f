//! Search for a wire plan.
//!
//! The search starts with one replica per shared resource. After every
//! evaluation, the explorer decides whether the new plan is an improvement
//! over the accepted one and, if so, proposes the next plan by giving one
//! more replica to the most contended resource. It stops as soon as a plan
//! fails to improve, nothing is contended enough, or the iteration budget
//! runs out. The accepted plan is the result in all three cases.
use super::{PlanOutcome, WirePlan, WirePlanSet};
use crate::config::ExplorerConfig;
use std::collections::BTreeMap;
use wiresched_ir::{self as ir, ResourceIdx};

pub struct Explorer {
    config: ExplorerConfig,
    plans: WirePlanSet,
}

impl Explorer {
    pub fn new(table: &ir::Table, config: ExplorerConfig) -> Self {
        Explorer {
            config,
            plans: WirePlanSet::new(table),
        }
    }

    /// Propose the first plan: one replica for every resource.
    pub fn set_initial_allocation(&mut self) -> usize {
        let replicas = self.plans.entries().map(|e| (e.resource, 1)).collect();
        self.plans.add_plan(replicas)
    }

    /// The plan to evaluate next.
    pub fn current_plan(&self) -> Option<&WirePlan> {
        self.plans.latest().filter(|p| p.outcome().is_none())
    }

    pub fn record_outcome(&mut self, plan: usize, outcome: PlanOutcome) {
        if let Some(plan) = self.plans.plan_mut(plan) {
            plan.set_outcome(outcome);
        }
    }

    /// Decide on the latest evaluated plan and propose the next one.
    /// Returns `false` when the search is over.
    pub fn may_set_next_allocation_plan(&mut self) -> bool {
        let Some(latest) = self.plans.latest() else {
            return false;
        };
        let Some(outcome) = latest.outcome() else {
            return false;
        };
        let latest_id = latest.id();
        let accept = match self.plans.accepted().and_then(WirePlan::outcome) {
            None => true,
            Some(prev) => self.had_sufficient_improvement(prev, outcome),
        };
        if !accept {
            log::info!(
                "plan {latest_id} does not improve enough, keeping plan {}",
                self.plans.accepted().map_or(0, WirePlan::id)
            );
            return false;
        }
        self.plans.set_accepted(latest_id);
        if self.plans.plans().len() >= self.config.max_iterations {
            log::warn!(
                "wire plan search stopped after {} iteration(s) without converging",
                self.plans.plans().len()
            );
            return false;
        }
        self.may_resolve_too_many_resource_uses()
    }

    /// Whether `next` is worth switching to from `prev`.
    pub fn had_sufficient_improvement(
        &self,
        prev: &PlanOutcome,
        next: &PlanOutcome,
    ) -> bool {
        if next.infeasible_blocks != prev.infeasible_blocks {
            return next.infeasible_blocks < prev.infeasible_blocks;
        }
        if prev.mux_complexity <= 0.0 {
            return false;
        }
        let gain =
            (prev.mux_complexity - next.mux_complexity) / prev.mux_complexity;
        gain >= self.config.min_improvement
    }

    /// Propose a plan that adds a replica to the resource with the highest
    /// usage rate, if that rate is above the threshold. Rates are taken from
    /// the measured outcome of the accepted plan.
    fn may_resolve_too_many_resource_uses(&mut self) -> bool {
        let Some(accepted) = self.plans.accepted() else {
            return false;
        };
        let threshold = match accepted.outcome() {
            Some(o) if o.infeasible_blocks > 0 => 1.0,
            _ => self.config.usage_threshold,
        };
        let mut busiest: Option<(ResourceIdx, f64)> = None;
        for entry in self.plans.entries() {
            let rate = accepted.usage_rate(entry);
            if rate > threshold && busiest.is_none_or(|(_, r)| rate > r) {
                busiest = Some((entry.resource, rate));
            }
        }
        let Some((res, rate)) = busiest else {
            log::debug!("no resource is used more than {threshold} times per replica");
            return false;
        };
        let mut replicas: BTreeMap<ResourceIdx, u32> = self
            .plans
            .entries()
            .map(|e| (e.resource, accepted.replicas_of(e.resource)))
            .collect();
        let n = replicas.entry(res).or_insert(1);
        *n += 1;
        log::info!(
            "{} is used {rate:.2} times per replica, trying {n} replica(s)",
            self.plans.entry(res).map_or_else(Default::default, |e| e.name),
        );
        self.plans.add_plan(replicas);
        true
    }

    /// Uses per replica of `res` under the accepted plan.
    pub fn get_usage_rate(&self, res: ResourceIdx) -> Option<f64> {
        let entry = self.plans.entry(res)?;
        Some(self.plans.accepted()?.usage_rate(entry))
    }

    pub fn wire_plan_set(&self) -> &WirePlanSet {
        &self.plans
    }

    pub fn into_wire_plan_set(self) -> WirePlanSet {
        self.plans
    }
}
