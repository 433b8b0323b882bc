//! Flow-sensitive type propagation over SSA values.

mod callsite;
mod lattice;
mod transfer;

pub mod errors;

pub use crate::typing::callsite::CallSiteOptimizationInfo;
pub use crate::typing::lattice::{class_type, Lattice};
pub use crate::typing::transfer::{compute_phi_type, evaluate};

use crate::errors::AnalysisResult;
use crate::repo::{Method, Repo};
use crate::typing::errors::TypeError;
use crate::Options;
use dw_ir::instrs::InstrKind;
use dw_ir::lattice::{Nullability, TypeElement};
use dw_ir::{Code, Definition, InstrId, ValueId};
use fixedbitset::FixedBitSet;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

macro_rules! tc {
    ( $t1:ident <: $t2:expr ; $repo:expr ) => {
        $t1.less_or_equal($t2, $repo)
    };
}
pub(crate) use tc;

/// How a recomputed type is merged into the type already recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Types only grow, by joining the recomputed type.
    Widening,
    /// Recomputed types replace recorded ones, they may only get sharper.
    Narrowing,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Widening => write!(f, "widening"),
            Self::Narrowing => write!(f, "narrowing"),
        }
    }
}

/// FIFO of values, each value being at most once in the queue.
#[derive(Debug)]
struct Worklist {
    queue: VecDeque<ValueId>,
    enqueued: FixedBitSet,
}

impl Worklist {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            enqueued: FixedBitSet::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: ValueId) {
        if value.index() >= self.enqueued.len() {
            self.enqueued.grow(value.index() + 1);
        }
        if !self.enqueued.put(value.index()) {
            self.queue.push_back(value);
        }
    }

    fn pop(&mut self) -> Option<ValueId> {
        let value = self.queue.pop_front()?;
        self.enqueued.set(value.index(), false);
        Some(value)
    }
}

/// The type recorded for a value after an update in the given mode.
pub fn updated_type(
    old_type: &TypeElement,
    new_type: &TypeElement,
    mode: Mode,
    repo: &Repo,
) -> TypeElement {
    match mode {
        Mode::Widening => old_type.join(new_type, repo),
        Mode::Narrowing => new_type.clone(),
    }
}

/// Computes and refines the types of the values of a method body.
#[derive(Debug, Clone, Copy)]
pub struct TypeAnalysis<'a> {
    repo: &'a Repo,
    options: Options,
    call_site_info: Option<&'a CallSiteOptimizationInfo>,
}

impl<'a> TypeAnalysis<'a> {
    #[must_use]
    pub const fn new(repo: &'a Repo, options: Options) -> Self {
        Self {
            repo,
            options,
            call_site_info: None,
        }
    }

    /// Argument types are bounded by the given call sites information.
    #[must_use]
    pub const fn with_call_site_info(mut self, info: &'a CallSiteOptimizationInfo) -> Self {
        self.call_site_info = Some(info);
        self
    }

    /// Computes a first approximation of the types of all the values of
    /// `code`, the body of `method` analyzed while compiling `context`
    /// (which differs from `method` when `code` is being inlined).
    ///
    /// # Errors
    ///
    /// Fails when the body has more arguments than the method signature, or
    /// when an internal invariant of the fixpoint is broken.
    pub fn widen(&self, context: &Method, method: &Method, code: &mut Code) -> AnalysisResult<()> {
        log::debug!("widening types of {}", method.descriptor());
        let worklist = self.seed(context, method, code)?;
        self.run(code, worklist, Mode::Widening)?;
        Ok(())
    }

    /// Types the arguments and the invariant values, and returns the other
    /// values to process.
    fn seed(&self, context: &Method, method: &Method, code: &mut Code) -> AnalysisResult<Worklist> {
        let mut worklist = Worklist::with_capacity(code.values_count());
        let mut argument_index = 0;

        for block in code.topologically_sorted_blocks() {
            for phi in code.block(block).phis() {
                worklist.push(*phi);
            }
            for instr in code.block(block).instructions().to_vec() {
                let Some(out) = code.instr(instr).out() else {
                    continue;
                };
                let kind = code.instr(instr).kind();
                if matches!(kind, InstrKind::Argument) {
                    let type_ = self.argument_type(context, method, argument_index)?;
                    argument_index += 1;
                    code.set_type(out, type_);
                } else if kind.has_invariant_out_type() {
                    let type_ = evaluate(code, instr, self.repo);
                    code.set_type(out, type_);
                } else {
                    worklist.push(out);
                }
            }
        }
        Ok(worklist)
    }

    /// Widens the types of the given values and of their users.
    pub fn widen_values<I>(&self, code: &mut Code, values: I) -> AnalysisResult<()>
    where
        I: IntoIterator<Item = ValueId>,
    {
        let mut worklist = Worklist::with_capacity(code.values_count());
        for value in values {
            worklist.push(value);
        }
        self.run(code, worklist, Mode::Widening)?;
        Ok(())
    }

    /// Sharpens the types of the given values and of their users, after a
    /// transformation made some facts more precise.
    ///
    /// Values are processed in increasing order whatever the iteration order
    /// of `values`.
    pub fn narrow<I>(&self, code: &mut Code, values: I) -> AnalysisResult<()>
    where
        I: IntoIterator<Item = ValueId>,
    {
        let sorted: BTreeSet<ValueId> = values.into_iter().collect();
        let mut worklist = Worklist::with_capacity(code.values_count());
        for value in sorted {
            worklist.push(value);
        }
        self.run(code, worklist, Mode::Narrowing)?;
        Ok(())
    }

    fn argument_type(
        &self,
        context: &Method,
        method: &Method,
        index: usize,
    ) -> AnalysisResult<TypeElement> {
        let parameter = |i: usize| {
            method
                .parameters_types()
                .get(i)
                .map(|t| TypeElement::from_type(t, Nullability::MaybeNull))
        };
        let declared = if method.is_static() {
            parameter(index)
        } else if index == 0 {
            // an inlined callee may be given a null receiver
            let nullability = if context.uid() == method.uid() {
                Nullability::DefinitelyNotNull
            } else {
                Nullability::MaybeNull
            };
            Some(TypeElement::class(method.definer(), nullability))
        } else {
            parameter(index - 1)
        };
        let declared = declared.ok_or_else(|| TypeError::ArgumentCount {
            index,
            method: method.descriptor().clone(),
        })?;

        match self.call_site_info.and_then(|info| info.argument_bound(index)) {
            Some(bound) if tc!(bound <: &declared; self.repo) => Ok(bound.clone()),
            _ => Ok(declared),
        }
    }

    /// Drains `worklist`, returning the number of values processed.
    fn run(&self, code: &mut Code, mut worklist: Worklist, mode: Mode) -> AnalysisResult<usize> {
        let mut steps = 0usize;
        while let Some(value) = worklist.pop() {
            steps += 1;
            self.analyze_value(code, value, mode, &mut worklist)?;
        }
        log::trace!("{mode} fixpoint reached after {steps} step(s)");
        Ok(steps)
    }

    fn analyze_value(
        &self,
        code: &mut Code,
        value: ValueId,
        mode: Mode,
        worklist: &mut Worklist,
    ) -> AnalysisResult<()> {
        let new_type = match code.value(value).definition() {
            Some(Definition::Phi { .. }) => compute_phi_type(code, value, self.repo),
            Some(Definition::Instr(instr)) => {
                if matches!(code.instr(*instr).kind(), InstrKind::Argument) {
                    return Ok(());
                }
                evaluate(code, *instr, self.repo)
            }
            None => return Ok(()),
        };
        self.update(code, value, new_type, mode, worklist)
    }

    fn update(
        &self,
        code: &mut Code,
        value: ValueId,
        new_type: TypeElement,
        mode: Mode,
        worklist: &mut Worklist,
    ) -> AnalysisResult<()> {
        let old_type = code.type_of(value);
        if new_type.is_bottom() || *old_type == new_type {
            return Ok(());
        }
        let updated = updated_type(old_type, &new_type, mode, self.repo);
        if cfg!(debug_assertions) {
            self.check_update(value, old_type, &updated, mode)?;
        }
        if updated == *old_type {
            return Ok(());
        }

        log::trace!("{mode} {value}: {old_type} -> {updated}");
        code.set_type(value, updated);
        for affected in code.affected_values(value) {
            worklist.push(affected);
        }
        Ok(())
    }

    fn check_update(
        &self,
        value: ValueId,
        old_type: &TypeElement,
        updated: &TypeElement,
        mode: Mode,
    ) -> Result<(), TypeError> {
        if mode == Mode::Narrowing && !old_type.is_bottom() && !tc!(updated <: old_type; self.repo)
        {
            return Err(TypeError::NotNarrower {
                value,
                from: old_type.clone(),
                to: updated.clone(),
            });
        }
        if updated.is_precise() || self.options.imprecise_types_allowed() {
            return Ok(());
        }
        if old_type.is_bottom() {
            Err(TypeError::ImpreciseType {
                value,
                type_: updated.clone(),
            })
        } else {
            Err(TypeError::PrecisionLoss {
                value,
                from: old_type.clone(),
                to: updated.clone(),
            })
        }
    }

    /// The most specific class known for the receiver of `invoke`, falling
    /// back to the holder of the invoked method. `None` if `invoke` is not
    /// an invocation.
    #[must_use]
    pub fn refined_receiver_type(&self, code: &Code, invoke: InstrId) -> Option<String> {
        let instr = code.instr(invoke);
        let method = instr.kind().invoked_method()?;
        let holder = method.definer();
        let candidates: Vec<&String> = instr
            .receiver()
            .and_then(|receiver| code.type_of(receiver).class_names())
            .map(|types| {
                types
                    .iter()
                    .filter(|name| self.repo.is_typeable_as(name, holder))
                    .collect()
            })
            .unwrap_or_default();

        let refined = candidates
            .iter()
            .find(|name| self.repo.is_interface(name) == Some(false))
            .or_else(|| candidates.first())
            .map_or_else(|| holder.to_string(), |name| (*name).clone());
        Some(refined)
    }
}
