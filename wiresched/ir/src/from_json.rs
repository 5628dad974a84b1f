//! Loads a [Table] from its JSON description.
//!
//! ```json
//! {
//!   "name": "main",
//!   "resources": [{ "name": "mul0", "class": "mul", "params": { "delay": "4" } }],
//!   "registers": [{ "name": "a", "kind": "reg", "initialized": true },
//!                 { "name": "p", "kind": "wire" }],
//!   "blocks": [{ "id": 0, "states": [[
//!     { "id": 1, "resource": "mul0", "inputs": ["a", "a"], "outputs": ["p"] }
//!   ]] }]
//! }
//! ```
//!
//! The built-in resource classes are installed unless `default_classes` is
//! `false`; `classes` adds to (or replaces) them.
use crate::{
    BasicBlock, Insn, RegIdx, RegKind, ResourceParams, State, Table,
    TableBuilder,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use wiresched_utils::{Error, SchedResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDef {
    pub name: String,
    #[serde(default = "yes")]
    pub default_classes: bool,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    pub resources: Vec<ResourceDef>,
    pub registers: Vec<RegisterDef>,
    pub blocks: Vec<BlockDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDef {
    pub name: String,
    #[serde(default)]
    pub exclusive: bool,
    #[serde(default)]
    pub transition: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDef {
    pub name: String,
    pub class: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterDef {
    pub name: String,
    pub kind: RegKind,
    #[serde(default)]
    pub initialized: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDef {
    pub id: u32,
    pub states: Vec<Vec<InsnDef>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InsnDef {
    pub id: u32,
    pub resource: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

fn yes() -> bool {
    true
}

/// Parse a table from a JSON string.
pub fn parse_str(src: &str) -> SchedResult<Table> {
    let def: TableDef = serde_json::from_str(src)?;
    def_to_table(def)
}

/// Parse a table from a JSON file.
pub fn parse_file(path: &Path) -> SchedResult<Table> {
    let src = std::fs::read_to_string(path)?;
    parse_str(&src)
}

/// Convert the deserialized description into a [Table].
pub fn def_to_table(def: TableDef) -> SchedResult<Table> {
    let mut builder = TableBuilder::new(def.name.as_str());
    // User classes first so that they take precedence over the defaults.
    for class in &def.classes {
        builder.add_class(class.name.as_str(), class.exclusive, class.transition)?;
    }
    if def.default_classes {
        builder.install_default_classes();
    }
    for res in &def.resources {
        let class = builder.class(&res.class)?;
        let params: ResourceParams = res.params.iter().collect();
        builder.add_resource(res.name.as_str(), class, params)?;
    }
    let mut regs = BTreeMap::new();
    for reg in &def.registers {
        let idx =
            builder.add_register(reg.name.as_str(), reg.kind, reg.initialized)?;
        regs.insert(reg.name.clone(), idx);
    }
    let lookup_regs = |names: &[String]| -> SchedResult<Vec<RegIdx>> {
        names
            .iter()
            .map(|n| {
                regs.get(n).copied().ok_or_else(|| {
                    Error::malformed_input(format!("unknown register `{n}`"))
                })
            })
            .collect()
    };
    let mut blocks = Vec::with_capacity(def.blocks.len());
    for bb in &def.blocks {
        let mut states = Vec::with_capacity(bb.states.len());
        for st in &bb.states {
            let mut insns = Vec::with_capacity(st.len());
            for insn in st {
                let res = builder.resource(&insn.resource)?;
                let inputs =
                    lookup_regs(&insn.inputs).map_err(|e| e.in_block(bb.id))?;
                let outputs =
                    lookup_regs(&insn.outputs).map_err(|e| e.in_block(bb.id))?;
                insns.push(Insn::new(insn.id, res, &inputs, &outputs));
            }
            states.push(State::new(insns));
        }
        blocks.push(BasicBlock::new(bb.id, states));
    }
    for bb in blocks {
        builder.add_block(bb)?;
    }
    log::debug!(
        "loaded table `{}` with {} block(s)",
        def.name,
        def.blocks.len()
    );
    Ok(builder.build())
}
