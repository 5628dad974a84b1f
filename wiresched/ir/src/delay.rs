use crate::{Insn, ResourceParams, Table, classes};
use std::collections::HashMap;
use wiresched_utils::Id;

/// Maps instructions to their combinational propagation delay.
pub trait DelayModel {
    /// Delay of one instruction in abstract time units.
    fn delay_of(&self, table: &Table, insn: &Insn) -> u32;

    /// Largest accumulated delay allowed within one state.
    fn max_delay(&self) -> u32;
}

/// Table-driven [DelayModel].
///
/// The delay of an instruction is, in order of precedence, the `delay`
/// parameter of its resource, the delay registered for its class with
/// [DelayInfo::set_class_delay], the built-in default of the class, and
/// finally `default_delay`.
#[derive(Debug, Clone)]
pub struct DelayInfo {
    max_delay: u32,
    default_delay: u32,
    class_delays: HashMap<Id, u32>,
}

impl DelayInfo {
    pub fn new(max_delay: u32) -> Self {
        DelayInfo {
            max_delay,
            default_delay: 1,
            class_delays: HashMap::new(),
        }
    }

    pub fn with_default_delay(mut self, delay: u32) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn set_class_delay(&mut self, class: impl Into<Id>, delay: u32) {
        self.class_delays.insert(class.into(), delay);
    }
}

impl DelayModel for DelayInfo {
    fn delay_of(&self, table: &Table, insn: &Insn) -> u32 {
        let res = table.resource(insn.resource);
        if let Some(d) = res.params.lookup_int(ResourceParams::DELAY) {
            return u32::try_from(d.max(0)).unwrap_or(u32::MAX);
        }
        let class = table.class(res.class).name;
        self.class_delays
            .get(&class)
            .copied()
            .or_else(|| classes::default_delay(class.as_str()))
            .unwrap_or(self.default_delay)
    }

    fn max_delay(&self) -> u32 {
        self.max_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BasicBlock, RegKind, State, TableBuilder};

    #[test]
    fn delay_precedence() {
        let mut b = TableBuilder::new("main");
        b.install_default_classes();
        let mul = b.add_resource_of("mul0", classes::MUL).unwrap();
        let add = b.add_resource_of("add0", classes::ADD).unwrap();
        let mul_class = b.class(classes::MUL).unwrap();
        let fast_mul = b
            .add_resource(
                "mul1",
                mul_class,
                [(ResourceParams::DELAY, "3")].into_iter().collect(),
            )
            .unwrap();
        let custom = b.add_class("custom", false, false).unwrap();
        let cus = b
            .add_resource("cus0", custom, ResourceParams::default())
            .unwrap();
        let r = b.add_register("r", RegKind::Reg, true).unwrap();
        let insns = vec![
            Insn::new(1, mul, &[r], &[r]),
            Insn::new(2, add, &[r], &[r]),
            Insn::new(3, fast_mul, &[r], &[r]),
            Insn::new(4, cus, &[r], &[r]),
        ];
        b.add_block(BasicBlock::new(0, vec![State::new(insns)]))
            .unwrap();
        let table = b.build();

        let mut dinfo = DelayInfo::new(10).with_default_delay(4);
        dinfo.set_class_delay(classes::ADD, 1);
        let delays = table.blocks()[0]
            .insns()
            .map(|(_, i)| dinfo.delay_of(&table, i))
            .collect::<Vec<_>>();
        assert_eq!(delays, vec![5, 1, 3, 4]);
        assert_eq!(dinfo.max_delay(), 10);
    }

    #[test]
    fn oversized_delay_saturates() {
        let mut b = TableBuilder::new("main");
        let class = b.add_class("slow", false, false).unwrap();
        let huge = b
            .add_resource(
                "slow0",
                class,
                [(ResourceParams::DELAY, "8589934592")].into_iter().collect(),
            )
            .unwrap();
        let r = b.add_register("r", RegKind::Reg, true).unwrap();
        b.add_block(BasicBlock::new(
            0,
            vec![State::new(vec![Insn::new(1, huge, &[r], &[r])])],
        ))
        .unwrap();
        let table = b.build();
        let insn = table.blocks()[0].insns().next().unwrap().1;
        assert_eq!(DelayInfo::new(10).delay_of(&table, insn), u32::MAX);
    }
}
