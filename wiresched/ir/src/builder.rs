//! IR Builder. Provides convenience methods to construct a [Table] and checks
//! that everything added to it refers to things that exist.
use crate::{
    BasicBlock, ClassIdx, RegIdx, RegKind, Register, Resource, ResourceClass,
    ResourceIdx, ResourceParams, Table, classes,
};
use std::collections::HashSet;
use wiresched_utils::{Error, Id, IndexedMap, SchedResult};

#[derive(Debug)]
pub struct TableBuilder {
    table: Table,
    insn_ids: HashSet<u32>,
    block_ids: HashSet<u32>,
}

impl TableBuilder {
    pub fn new(name: impl Into<Id>) -> Self {
        TableBuilder {
            table: Table {
                name: name.into(),
                classes: IndexedMap::new(),
                resources: IndexedMap::new(),
                registers: IndexedMap::new(),
                blocks: Vec::new(),
            },
            insn_ids: HashSet::new(),
            block_ids: HashSet::new(),
        }
    }

    /// Add every built-in resource class that is not defined yet.
    pub fn install_default_classes(&mut self) -> &mut Self {
        for (name, info) in classes::DEFAULT_CLASSES.iter() {
            if self.table.find_class(name).is_none() {
                self.table.classes.push(ResourceClass {
                    name: Id::new(name),
                    exclusive: info.exclusive,
                    transition: info.transition,
                });
            }
        }
        self
    }

    pub fn add_class(
        &mut self,
        name: impl Into<Id>,
        exclusive: bool,
        transition: bool,
    ) -> SchedResult<ClassIdx> {
        let name = name.into();
        if self.table.find_class(name.as_str()).is_some() {
            return Err(Error::malformed_input(format!(
                "resource class `{name}` is defined twice"
            )));
        }
        Ok(self.table.classes.push(ResourceClass {
            name,
            exclusive,
            transition,
        }))
    }

    pub fn class(&self, name: &str) -> SchedResult<ClassIdx> {
        self.table.find_class(name).ok_or_else(|| {
            Error::malformed_input(format!("unknown resource class `{name}`"))
        })
    }

    pub fn add_resource(
        &mut self,
        name: impl Into<Id>,
        class: ClassIdx,
        params: ResourceParams,
    ) -> SchedResult<ResourceIdx> {
        let name = name.into();
        if self.table.find_resource(name.as_str()).is_some() {
            return Err(Error::malformed_input(format!(
                "resource `{name}` is defined twice"
            )));
        }
        if self.table.classes.get(class).is_none() {
            return Err(Error::malformed_input(format!(
                "resource `{name}` refers to a missing class"
            )));
        }
        Ok(self.table.resources.push(Resource {
            name,
            class,
            params,
        }))
    }

    pub fn resource(&self, name: &str) -> SchedResult<ResourceIdx> {
        self.table.find_resource(name).ok_or_else(|| {
            Error::malformed_input(format!("unknown resource `{name}`"))
        })
    }

    /// Shorthand for a resource with no parameters of a class looked up by
    /// name.
    pub fn add_resource_of(
        &mut self,
        name: impl Into<Id>,
        class: &str,
    ) -> SchedResult<ResourceIdx> {
        let class = self.class(class)?;
        self.add_resource(name, class, ResourceParams::default())
    }

    pub fn add_register(
        &mut self,
        name: impl Into<Id>,
        kind: RegKind,
        initialized: bool,
    ) -> SchedResult<RegIdx> {
        let name = name.into();
        if self.table.find_register(name.as_str()).is_some() {
            return Err(Error::malformed_input(format!(
                "register `{name}` is defined twice"
            )));
        }
        Ok(self.table.registers.push(Register {
            name,
            kind,
            initialized,
        }))
    }

    /// Add a basic block. Instruction and block ids must be unique within the
    /// table and every instruction must refer to known resources and
    /// registers.
    pub fn add_block(&mut self, bb: BasicBlock) -> SchedResult<&mut Self> {
        if !self.block_ids.insert(bb.id.0) {
            return Err(Error::malformed_input(format!(
                "basic block {} is defined twice",
                bb.id
            )));
        }
        for (_, insn) in bb.insns() {
            if !self.insn_ids.insert(insn.id.0) {
                return Err(Error::malformed_input(format!(
                    "instruction {} is defined twice",
                    insn.id
                ))
                .in_block(bb.id));
            }
            if self.table.resources.get(insn.resource).is_none() {
                return Err(Error::malformed_input(format!(
                    "instruction {} is bound to a missing resource",
                    insn.id
                ))
                .in_block(bb.id));
            }
            let missing_reg = insn
                .inputs
                .iter()
                .chain(insn.outputs.iter())
                .any(|r| self.table.registers.get(*r).is_none());
            if missing_reg {
                return Err(Error::malformed_input(format!(
                    "instruction {} uses a missing register",
                    insn.id
                ))
                .in_block(bb.id));
            }
        }
        self.table.blocks.push(bb);
        Ok(self)
    }

    pub fn build(self) -> Table {
        self.table
    }
}
