use serde::Serialize;
use wiresched_ir::{BbId, InsnId};
use wiresched_utils::{Error, Id};

/// Where one instruction ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsnPlacement {
    pub insn: InsnId,
    pub initial_state: usize,
    pub state: usize,
    pub resource: Id,
    pub replica: u32,
}

/// The schedule of one basic block. Placements are in program order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSchedule {
    pub bb: BbId,
    pub num_states: usize,
    pub insns: Vec<InsnPlacement>,
}

impl BlockSchedule {
    pub fn placement(&self, insn: InsnId) -> Option<&InsnPlacement> {
        self.insns.iter().find(|p| p.insn == insn)
    }

    pub fn state_of(&self, insn: InsnId) -> Option<usize> {
        self.placement(insn).map(|p| p.state)
    }
}

/// A block that could not be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockFailure {
    pub bb: Option<BbId>,
    /// The block may succeed under a different wire plan.
    pub recoverable: bool,
    pub message: String,
}

impl From<&Error> for BlockFailure {
    fn from(err: &Error) -> Self {
        BlockFailure {
            bb: err.block().map(BbId),
            recoverable: err.is_recoverable(),
            message: err.message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplicaCount {
    pub resource: Id,
    pub replicas: u32,
}

/// The result of scheduling a whole table under the accepted wire plan.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchedule {
    pub table: Id,
    /// Replicas of every shared exclusive resource.
    pub plan: Vec<ReplicaCount>,
    /// Number of wire plans evaluated.
    pub iterations: usize,
    pub total_states: usize,
    pub mux_complexity: f64,
    pub blocks: Vec<BlockSchedule>,
    pub failures: Vec<BlockFailure>,
}

impl TableSchedule {
    pub fn block(&self, bb: BbId) -> Option<&BlockSchedule> {
        self.blocks.iter().find(|b| b.bb == bb)
    }

    pub fn failure(&self, bb: BbId) -> Option<&BlockFailure> {
        self.failures.iter().find(|f| f.bb == Some(bb))
    }

    pub fn replicas_of(&self, resource: &str) -> u32 {
        self.plan
            .iter()
            .find(|r| r.resource == resource)
            .map_or(1, |r| r.replicas)
    }
}
