//! SSA code of a method.
//!
//! A [`Code`] owns three arenas: values, instructions and blocks. Entities
//! refer to each other through the copyable handles [`ValueId`],
//! [`InstrId`] and [`BlockId`], so that the def-use and use-def relations
//! can be navigated in both directions without shared ownership.
//!
//! Instructions are never removed from the instruction arena: replacing an
//! instruction detaches the old one (its block becomes `None`) and allocates
//! a new handle, so that analyses can still refer to the original
//! instruction after a rewrite.

use crate::dominators::DominatorTree;
use crate::errors::{IrError, IrResult};
use crate::instrs::InstrKind;
use crate::lattice::TypeElement;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Handle of an SSA value, its index is also its ordinal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(usize);

/// Handle of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstrId(usize);

/// Handle of a basic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(usize);

macro_rules! handle_impl {
    ($handle:ident, $prefix:literal) => {
        impl $handle {
            #[inline]
            #[must_use]
            pub const fn index(self) -> usize {
                self.0
            }

            #[inline]
            #[must_use]
            pub const fn from_index(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $handle {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

handle_impl!(ValueId, "v");
handle_impl!(InstrId, "i");
handle_impl!(BlockId, "B");

/// What defines a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Instr(InstrId),
    /// A phi at the beginning of a block, operands being ordered as the
    /// block predecessors.
    Phi {
        block: BlockId,
        operands: Vec<ValueId>,
    },
}

#[derive(Debug, Clone)]
pub struct Value {
    id: ValueId,
    type_: TypeElement,
    definition: Option<Definition>,
    users: BTreeSet<InstrId>,
    phi_users: BTreeSet<ValueId>,
    local: Option<String>,
}

impl Value {
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ValueId {
        self.id
    }

    /// Ordinal number of the value, values being numbered in creation order.
    #[inline]
    #[must_use]
    pub const fn number(&self) -> usize {
        self.id.0
    }

    #[inline]
    #[must_use]
    pub const fn type_(&self) -> &TypeElement {
        &self.type_
    }

    #[inline]
    #[must_use]
    pub const fn definition(&self) -> Option<&Definition> {
        self.definition.as_ref()
    }

    #[must_use]
    pub const fn is_phi(&self) -> bool {
        matches!(self.definition, Some(Definition::Phi { .. }))
    }

    /// Returns the defining instruction, if the value is not a phi.
    #[must_use]
    pub const fn definition_instr(&self) -> Option<InstrId> {
        if let Some(Definition::Instr(instr)) = self.definition {
            Some(instr)
        } else {
            None
        }
    }

    /// Instructions that use this value, each one listed once.
    #[inline]
    #[must_use]
    pub const fn users(&self) -> &BTreeSet<InstrId> {
        &self.users
    }

    /// Phis that use this value, each one listed once.
    #[inline]
    #[must_use]
    pub const fn phi_users(&self) -> &BTreeSet<ValueId> {
        &self.phi_users
    }

    /// Debug local variable name attached to the value, if any.
    #[inline]
    #[must_use]
    pub fn local(&self) -> Option<&str> {
        self.local.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn has_local_info(&self) -> bool {
        self.local.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Instruction {
    id: InstrId,
    kind: InstrKind,
    ins: Vec<ValueId>,
    out: Option<ValueId>,
    block: Option<BlockId>,
}

impl Instruction {
    #[inline]
    #[must_use]
    pub const fn id(&self) -> InstrId {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &InstrKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub fn ins(&self) -> &[ValueId] {
        &self.ins
    }

    #[inline]
    #[must_use]
    pub const fn out(&self) -> Option<ValueId> {
        self.out
    }

    /// Block holding the instruction, `None` once the instruction has been
    /// replaced.
    #[inline]
    #[must_use]
    pub const fn block(&self) -> Option<BlockId> {
        self.block
    }

    /// Receiver of a non-static invoke.
    #[must_use]
    pub fn receiver(&self) -> Option<ValueId> {
        match &self.kind {
            InstrKind::Invoke { kind, .. } if kind.has_receiver() => self.ins.first().copied(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    id: usize,
    phis: Vec<ValueId>,
    instrs: Vec<InstrId>,
    successors: Vec<BlockId>,
    catch_handlers: Vec<BlockId>,
    predecessors: Vec<BlockId>,
}

impl Block {
    #[inline]
    #[must_use]
    pub const fn id(&self) -> BlockId {
        BlockId(self.id)
    }

    #[inline]
    #[must_use]
    pub fn phis(&self) -> &[ValueId] {
        &self.phis
    }

    #[inline]
    #[must_use]
    pub fn instructions(&self) -> &[InstrId] {
        &self.instrs
    }

    /// Normal successors.
    #[inline]
    #[must_use]
    pub fn successors(&self) -> &[BlockId] {
        &self.successors
    }

    #[inline]
    #[must_use]
    pub fn catch_handlers(&self) -> &[BlockId] {
        &self.catch_handlers
    }

    #[inline]
    #[must_use]
    pub fn has_catch_handlers(&self) -> bool {
        !self.catch_handlers.is_empty()
    }

    /// Predecessors in edge insertion order, phi operands follow this order.
    #[inline]
    #[must_use]
    pub fn predecessors(&self) -> &[BlockId] {
        &self.predecessors
    }

    /// Normal successors followed by exceptional ones.
    pub fn all_successors(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.successors
            .iter()
            .chain(self.catch_handlers.iter())
            .copied()
    }
}

/// The SSA graph of a method body, the first block being the entry block.
#[derive(Debug, Clone, Default)]
pub struct Code {
    blocks: Vec<Block>,
    values: Vec<Value>,
    instrs: Vec<Instruction>,
}

impl Code {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub const fn entry(&self) -> BlockId {
        BlockId(0)
    }

    #[inline]
    #[must_use]
    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    #[inline]
    #[must_use]
    pub fn instr(&self, id: InstrId) -> &Instruction {
        &self.instrs[id.0]
    }

    #[inline]
    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    #[must_use]
    pub fn values_count(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn blocks_count(&self) -> usize {
        self.blocks.len()
    }

    /// Iterates over the attached instructions, block after block.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks
            .iter()
            .flat_map(|block| block.instrs.iter().map(|id| &self.instrs[id.0]))
    }

    /// Number of attached instructions, phis excluded.
    #[must_use]
    pub fn instructions_count(&self) -> usize {
        self.blocks.iter().map(|block| block.instrs.len()).sum()
    }

    pub fn type_of(&self, id: ValueId) -> &TypeElement {
        &self.values[id.0].type_
    }

    pub fn set_type(&mut self, id: ValueId, type_: TypeElement) {
        self.values[id.0].type_ = type_;
    }

    pub fn add_block(&mut self) -> BlockId {
        let id = self.blocks.len();
        self.blocks.push(Block {
            id,
            ..Block::default()
        });
        BlockId(id)
    }

    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.blocks[from.0].successors.push(to);
        self.blocks[to.0].predecessors.push(from);
    }

    pub fn add_catch_handler(&mut self, from: BlockId, handler: BlockId) {
        self.blocks[from.0].catch_handlers.push(handler);
        self.blocks[handler.0].predecessors.push(from);
    }

    /// Creates a value without definition, it has to be defined by a phi or
    /// an instruction afterwards.
    pub fn create_value(&mut self, type_: TypeElement, local: Option<String>) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(Value {
            id,
            type_,
            definition: None,
            users: BTreeSet::new(),
            phi_users: BTreeSet::new(),
            local,
        });
        id
    }

    pub fn add_phi(&mut self, block: BlockId, out: ValueId, operands: Vec<ValueId>) {
        for operand in &operands {
            self.values[operand.0].phi_users.insert(out);
        }
        self.values[out.0].definition = Some(Definition::Phi { block, operands });
        self.blocks[block.0].phis.push(out);
    }

    /// Operands of a phi, empty for any other value.
    #[must_use]
    pub fn phi_operands(&self, phi: ValueId) -> &[ValueId] {
        match &self.values[phi.0].definition {
            Some(Definition::Phi { operands, .. }) => operands,
            _ => &[],
        }
    }

    /// Returns the block defining a value.
    #[must_use]
    pub fn definition_block(&self, id: ValueId) -> Option<BlockId> {
        match self.values[id.0].definition.as_ref()? {
            Definition::Instr(instr) => self.instrs[instr.0].block,
            Definition::Phi { block, .. } => Some(*block),
        }
    }

    fn new_instruction(
        &mut self,
        kind: InstrKind,
        ins: Vec<ValueId>,
        out: Option<ValueId>,
        block: BlockId,
    ) -> InstrId {
        let id = InstrId(self.instrs.len());
        for value in &ins {
            self.values[value.0].users.insert(id);
        }
        if let Some(out) = out {
            self.values[out.0].definition = Some(Definition::Instr(id));
        }
        self.instrs.push(Instruction {
            id,
            kind,
            ins,
            out,
            block: Some(block),
        });
        id
    }

    pub fn append_instruction(
        &mut self,
        block: BlockId,
        kind: InstrKind,
        ins: Vec<ValueId>,
        out: Option<ValueId>,
    ) -> InstrId {
        let id = self.new_instruction(kind, ins, out, block);
        self.blocks[block.0].instrs.push(id);
        id
    }

    fn position(&self, instr: InstrId) -> IrResult<(BlockId, usize)> {
        let block = self.instrs[instr.0]
            .block
            .ok_or_else(|| IrError::Inconsistent(format!("{instr} is detached")))?;
        let position = self.blocks[block.0]
            .instrs
            .iter()
            .position(|id| *id == instr)
            .ok_or_else(|| IrError::Inconsistent(format!("{instr} is not listed in {block}")))?;
        Ok((block, position))
    }

    pub fn insert_instruction_before(
        &mut self,
        anchor: InstrId,
        kind: InstrKind,
        ins: Vec<ValueId>,
        out: Option<ValueId>,
    ) -> IrResult<InstrId> {
        let (block, position) = self.position(anchor)?;
        let id = self.new_instruction(kind, ins, out, block);
        self.blocks[block.0].instrs.insert(position, id);
        Ok(id)
    }

    /// Replaces an instruction by a new one of the given kind, with the same
    /// operands and out value.
    ///
    /// The old instruction is detached and keeps its content. Assumptions
    /// whose origin was the old instruction now refer to the new one.
    pub fn replace_instruction(&mut self, old: InstrId, kind: InstrKind) -> IrResult<InstrId> {
        let (block, position) = self.position(old)?;
        let ins = self.instrs[old.0].ins.clone();
        let out = self.instrs[old.0].out;
        for value in &ins {
            self.values[value.0].users.remove(&old);
        }
        let new = self.new_instruction(kind, ins, out, block);
        self.blocks[block.0].instrs[position] = new;
        self.instrs[old.0].block = None;

        for instr in &mut self.instrs {
            if let InstrKind::AssumeNonNull {
                origin: Some(origin),
            } = &mut instr.kind
            {
                if *origin == old {
                    *origin = new;
                }
            }
        }
        Ok(new)
    }

    /// Replaces every use of `old` by `new` in a single instruction.
    pub fn replace_value_in(&mut self, instr: InstrId, old: ValueId, new: ValueId) {
        if old == new {
            return;
        }
        let mut replaced = false;
        for value in &mut self.instrs[instr.0].ins {
            if *value == old {
                *value = new;
                replaced = true;
            }
        }
        if replaced {
            self.values[old.0].users.remove(&instr);
            self.values[new.0].users.insert(instr);
        }
    }

    /// Replaces `old` by `new` in the given instructions and in the given
    /// phi operands (phi value and operand indices). Other users of `old` are
    /// left untouched.
    pub fn replace_selective_users(
        &mut self,
        old: ValueId,
        new: ValueId,
        instrs: &BTreeSet<InstrId>,
        phis: &BTreeMap<ValueId, Vec<usize>>,
    ) {
        if old == new {
            return;
        }
        for instr in instrs {
            self.replace_value_in(*instr, old, new);
        }
        for (phi, indices) in phis {
            let still_used = if let Some(Definition::Phi { operands, .. }) =
                &mut self.values[phi.0].definition
            {
                for index in indices {
                    if operands.get(*index) == Some(&old) {
                        operands[*index] = new;
                    }
                }
                operands.contains(&old)
            } else {
                continue;
            };
            if !still_used {
                self.values[old.0].phi_users.remove(phi);
            }
            self.values[new.0].phi_users.insert(*phi);
        }
    }

    /// Values whose type may change when the type of `id` changes: the out
    /// values of its users and its phi users.
    #[must_use]
    pub fn affected_values(&self, id: ValueId) -> BTreeSet<ValueId> {
        let value = &self.values[id.0];
        value
            .users
            .iter()
            .filter_map(|instr| self.instrs[instr.0].out)
            .chain(value.phi_users.iter().copied())
            .collect()
    }

    /// Splits the block of `instr` right before it.
    ///
    /// The tail block starting with `instr` inherits the successors, the head
    /// block keeps the phis and ends with a `goto` to the tail. Both blocks
    /// are covered by the catch handlers of the original block, the phis of
    /// a handler receiving from the tail the operand they received from the
    /// head. Returns the tail block.
    pub fn split_block_before(&mut self, instr: InstrId) -> IrResult<BlockId> {
        let (head, position) = self.position(instr)?;
        let tail = self.add_block();

        let moved = self.blocks[head.0].instrs.split_off(position);
        for id in &moved {
            self.instrs[id.0].block = Some(tail);
        }
        let successors = std::mem::take(&mut self.blocks[head.0].successors);
        for succ in &successors {
            for pred in &mut self.blocks[succ.0].predecessors {
                if *pred == head {
                    *pred = tail;
                }
            }
        }
        let tail_block = &mut self.blocks[tail.0];
        tail_block.instrs = moved;
        tail_block.successors = successors;

        for handler in self.blocks[head.0].catch_handlers.clone() {
            let index = self.blocks[handler.0]
                .predecessors
                .iter()
                .position(|pred| *pred == head);
            self.add_catch_handler(tail, handler);
            let Some(index) = index else {
                continue;
            };
            for phi in self.blocks[handler.0].phis.clone() {
                if let Some(Definition::Phi { operands, .. }) = &mut self.values[phi.0].definition
                {
                    if let Some(operand) = operands.get(index).copied() {
                        operands.push(operand);
                    }
                }
            }
        }

        self.add_edge(head, tail);
        self.append_instruction(head, InstrKind::Goto, vec![], None);
        Ok(tail)
    }

    /// Control flow graph of the blocks, node indices being block indices.
    /// Exceptional edges are included.
    #[must_use]
    pub fn flow_graph(&self) -> DiGraph<BlockId, ()> {
        let mut graph = DiGraph::with_capacity(self.blocks.len(), self.blocks.len());
        for block in &self.blocks {
            graph.add_node(block.id());
        }
        for block in &self.blocks {
            for succ in block.all_successors() {
                graph.add_edge(NodeIndex::new(block.id), NodeIndex::new(succ.0), ());
            }
        }
        graph
    }

    /// Blocks in reverse post-order from the entry block, so that every block
    /// comes after its dominators. Unreachable blocks come last.
    #[must_use]
    pub fn topologically_sorted_blocks(&self) -> Vec<BlockId> {
        if self.blocks.is_empty() {
            return Vec::new();
        }
        let graph = self.flow_graph();
        let mut dfs = DfsPostOrder::new(&graph, NodeIndex::new(self.entry().0));
        let mut order = Vec::with_capacity(self.blocks.len());
        while let Some(node) = dfs.next(&graph) {
            order.push(graph[node]);
        }
        order.reverse();
        let reached: BTreeSet<BlockId> = order.iter().copied().collect();
        order.extend(
            self.blocks
                .iter()
                .map(Block::id)
                .filter(|block| !reached.contains(block)),
        );
        order
    }

    /// Checks the structural invariants of the SSA form: def-use and use-def
    /// relations agree, phis have one operand per predecessor and every
    /// (reachable) use is dominated by its definition.
    pub fn is_consistent_ssa(&self) -> IrResult<()> {
        let inconsistent = |msg: String| Err(IrError::Inconsistent(msg));

        for block in &self.blocks {
            for id in &block.instrs {
                let instr = &self.instrs[id.0];
                if instr.block != Some(block.id()) {
                    return inconsistent(format!("{id} listed in {} but not attached", block.id()));
                }
                for value in &instr.ins {
                    if !self.values[value.0].users.contains(id) {
                        return inconsistent(format!("{id} uses {value} but is not a user"));
                    }
                }
                if let Some(out) = instr.out {
                    if self.values[out.0].definition != Some(Definition::Instr(*id)) {
                        return inconsistent(format!("{out} is not defined by {id}"));
                    }
                }
            }
            for phi in &block.phis {
                match &self.values[phi.0].definition {
                    Some(Definition::Phi { block: b, operands }) if *b == block.id() => {
                        if operands.len() != block.predecessors.len() {
                            return inconsistent(format!(
                                "{phi} has {} operands for {} predecessors",
                                operands.len(),
                                block.predecessors.len()
                            ));
                        }
                        for operand in operands {
                            if !self.values[operand.0].phi_users.contains(phi) {
                                return inconsistent(format!(
                                    "{phi} uses {operand} but is not a phi user"
                                ));
                            }
                        }
                    }
                    _ => return inconsistent(format!("{phi} is not a phi of {}", block.id())),
                }
            }
        }

        for value in &self.values {
            for user in &value.users {
                let instr = &self.instrs[user.0];
                if instr.block.is_none() || !instr.ins.contains(&value.id) {
                    return inconsistent(format!("{} lists {user} as a stale user", value.id));
                }
            }
            for phi in &value.phi_users {
                if !self.phi_operands(*phi).contains(&value.id) {
                    return inconsistent(format!("{} lists {phi} as a stale phi user", value.id));
                }
            }
            let used = !value.users.is_empty() || !value.phi_users.is_empty();
            if used && self.definition_block(value.id).is_none() {
                return inconsistent(format!("{} is used but not defined", value.id));
            }
        }

        self.check_dominance()
    }

    fn check_dominance(&self) -> IrResult<()> {
        if self.blocks.is_empty() {
            return Ok(());
        }
        let dominators = DominatorTree::new(self);

        // Does the definition of `value` dominate position `position` of
        // `block`? (`None` stands for the end of the block.)
        let dominates = |value: ValueId, block: BlockId, position: Option<usize>| {
            let def_block = match self.definition_block(value) {
                Some(b) => b,
                None => return false,
            };
            if def_block != block {
                return dominators.dominated_by(block, def_block);
            }
            match (&self.values[value.0].definition, position) {
                (Some(Definition::Instr(def)), Some(position)) => self.blocks[block.0].instrs
                    [..position]
                    .contains(def),
                _ => true,
            }
        };

        for block in &self.blocks {
            if !dominators.is_reachable(block.id()) {
                continue;
            }
            for (position, id) in block.instrs.iter().enumerate() {
                for value in &self.instrs[id.0].ins {
                    if !dominates(*value, block.id(), Some(position)) {
                        return Err(IrError::Inconsistent(format!(
                            "{value} does not dominate its use in {id}"
                        )));
                    }
                }
            }
            for phi in &block.phis {
                for (operand, pred) in self.phi_operands(*phi).iter().zip(&block.predecessors) {
                    if dominators.is_reachable(*pred) && !dominates(*operand, *pred, None) {
                        return Err(IrError::Inconsistent(format!(
                            "{operand} does not reach {phi} from {pred}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrs::{Constant, InvokeKind};
    use crate::lattice::Nullability;
    use crate::{MethodDescr, Type};

    fn object() -> TypeElement {
        TypeElement::class("java/lang/Object", Nullability::MaybeNull)
    }

    // entry: v0 = argument; if v0 -> left | right, join: v1 = phi(v2, v3)
    fn diamond() -> (Code, Vec<BlockId>, ValueId) {
        let mut code = Code::new();
        let blocks: Vec<BlockId> = (0..4).map(|_| code.add_block()).collect();
        code.add_edge(blocks[0], blocks[1]);
        code.add_edge(blocks[0], blocks[2]);
        code.add_edge(blocks[1], blocks[3]);
        code.add_edge(blocks[2], blocks[3]);

        let arg = code.create_value(object(), None);
        code.append_instruction(blocks[0], InstrKind::Argument, vec![], Some(arg));
        code.append_instruction(blocks[0], InstrKind::If, vec![arg], None);
        let left = code.create_value(TypeElement::Bottom, None);
        code.append_instruction(
            blocks[1],
            InstrKind::Const(Constant::Int(1)),
            vec![],
            Some(left),
        );
        code.append_instruction(blocks[1], InstrKind::Goto, vec![], None);
        let right = code.create_value(TypeElement::Bottom, None);
        code.append_instruction(
            blocks[2],
            InstrKind::Const(Constant::Int(2)),
            vec![],
            Some(right),
        );
        code.append_instruction(blocks[2], InstrKind::Goto, vec![], None);
        let phi = code.create_value(TypeElement::Bottom, None);
        code.add_phi(blocks[3], phi, vec![left, right]);
        code.append_instruction(blocks[3], InstrKind::Return, vec![phi], None);
        (code, blocks, arg)
    }

    #[test]
    fn diamond_is_consistent() {
        let (code, blocks, _) = diamond();
        code.is_consistent_ssa().unwrap();
        assert_eq!(code.instructions_count(), 7);
        let order = code.topologically_sorted_blocks();
        assert_eq!(order[0], blocks[0]);
        assert_eq!(order[3], blocks[3]);
    }

    #[test]
    fn use_before_definition_is_detected() {
        let mut code = Code::new();
        let b0 = code.add_block();
        let v0 = code.create_value(TypeElement::Bottom, None);
        let v1 = code.create_value(TypeElement::Bottom, None);
        code.append_instruction(b0, InstrKind::Move, vec![v1], Some(v0));
        code.append_instruction(b0, InstrKind::Const(Constant::Null), vec![], Some(v1));
        assert!(matches!(
            code.is_consistent_ssa(),
            Err(IrError::Inconsistent(_))
        ));
    }

    #[test]
    fn replacement_detaches_and_updates_origins() {
        let mut code = Code::new();
        let b0 = code.add_block();
        let recv = code.create_value(object(), Some("o".to_string()));
        code.append_instruction(b0, InstrKind::Argument, vec![], Some(recv));
        let method = MethodDescr::new("a/I", "run", vec![], Type::Void);
        let invoke = code.append_instruction(
            b0,
            InstrKind::Invoke {
                kind: InvokeKind::Interface,
                method: method.clone(),
            },
            vec![recv],
            None,
        );
        let assumed = code.create_value(object(), None);
        let assume = code.append_instruction(
            b0,
            InstrKind::AssumeNonNull {
                origin: Some(invoke),
            },
            vec![recv],
            Some(assumed),
        );

        let new = code
            .replace_instruction(
                invoke,
                InstrKind::Invoke {
                    kind: InvokeKind::Virtual,
                    method: method.with_definer("a/A"),
                },
            )
            .unwrap();
        assert_ne!(new, invoke);
        assert_eq!(code.instr(invoke).block(), None);
        assert_eq!(code.instr(new).block(), Some(b0));
        assert!(code.value(recv).users().contains(&new));
        assert!(!code.value(recv).users().contains(&invoke));
        assert_eq!(
            code.instr(assume).kind(),
            &InstrKind::AssumeNonNull { origin: Some(new) }
        );
        code.is_consistent_ssa().unwrap();
    }

    #[test]
    fn selective_replacement() {
        let (mut code, blocks, arg) = diamond();
        let cast = code.create_value(object(), None);
        let if_instr = code.block(blocks[0]).instructions()[1];
        code.insert_instruction_before(
            if_instr,
            InstrKind::CheckCast(Type::class("a/A")),
            vec![arg],
            Some(cast),
        )
        .unwrap();
        code.replace_selective_users(arg, cast, &BTreeSet::from([if_instr]), &BTreeMap::new());
        assert_eq!(code.instr(if_instr).ins(), &[cast]);
        assert_eq!(code.value(arg).users().len(), 1);
        code.is_consistent_ssa().unwrap();
    }

    #[test]
    fn split_keeps_edges() {
        let mut code = Code::new();
        let b0 = code.add_block();
        let handler = code.add_block();
        let exit = code.add_block();
        code.add_edge(b0, exit);
        code.add_catch_handler(b0, handler);
        let v0 = code.create_value(object(), None);
        code.append_instruction(b0, InstrKind::Argument, vec![], Some(v0));
        let throwing = code.append_instruction(b0, InstrKind::ArrayLength, vec![v0], None);
        code.append_instruction(b0, InstrKind::Goto, vec![], None);
        code.append_instruction(exit, InstrKind::Return, vec![v0], None);
        code.append_instruction(handler, InstrKind::Throw, vec![v0], None);

        let tail = code.split_block_before(throwing).unwrap();
        assert_eq!(code.block(b0).successors(), &[tail]);
        assert_eq!(code.block(b0).catch_handlers(), &[handler]);
        assert_eq!(code.block(tail).catch_handlers(), &[handler]);
        assert_eq!(code.block(handler).predecessors(), &[b0, tail]);
        assert_eq!(code.block(exit).predecessors(), &[tail]);
        assert_eq!(code.instr(throwing).block(), Some(tail));
        assert_eq!(code.instructions_count(), 6);
        code.is_consistent_ssa().unwrap();
    }

    #[test]
    fn affected_values_of_argument() {
        let (code, _, arg) = diamond();
        assert!(code.affected_values(arg).is_empty());
        let phi = code.blocks().last().unwrap().phis()[0];
        let left = code.phi_operands(phi)[0];
        assert_eq!(code.affected_values(left), BTreeSet::from([phi]));
    }
}
