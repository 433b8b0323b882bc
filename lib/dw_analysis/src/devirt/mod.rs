//! Rewriting of invocations to more specific targets.
//!
//! Once the values of a method are typed, an `invoke-interface` whose
//! receiver can only dispatch to one concrete method becomes an
//! `invoke-virtual` of that method, and an `invoke-virtual` is rebound to the
//! most specific method known for its receiver. The rewritten code is then
//! narrowed so that users of the rewritten receivers see sharper types.

mod stats;

pub use crate::devirt::stats::DevirtStats;

use crate::errors::{AnalysisError, AnalysisResult};
use crate::repo::{Method, Repo};
use crate::typing::{tc, Lattice, TypeAnalysis};
use crate::Options;
use dw_ir::instrs::{InstrKind, InvokeKind};
use dw_ir::lattice::{Nullability, TypeElement};
use dw_ir::{BlockId, Code, InstrId, LazyDominatorTree, Type, ValueId};
use std::collections::{BTreeMap, BTreeSet};

/// State of the rewriting of a single method body.
#[derive(Debug, Default)]
struct Rewriting {
    dominators: LazyDominatorTree,
    /// Devirtualized invokes, mapped to the invokes they replaced.
    devirtualized: BTreeMap<InstrId, InstrId>,
    /// Casts already inserted, by receiver and target class.
    casts: BTreeMap<(ValueId, String), ValueId>,
    affected: BTreeSet<ValueId>,
    stats: DevirtStats,
}

/// The devirtualization pass.
#[derive(Debug, Clone, Copy)]
pub struct Devirtualizer<'a> {
    repo: &'a Repo,
    options: Options,
}

impl<'a> Devirtualizer<'a> {
    #[must_use]
    pub const fn new(repo: &'a Repo, options: Options) -> Self {
        Self { repo, options }
    }

    /// Rewrites the invocations of `code`, compiled in the context of
    /// `context`. Values must have been typed beforehand.
    ///
    /// Instructions are visited block after block, dominators first, so that
    /// a cast can be reused by every invocation it dominates.
    ///
    /// # Errors
    ///
    /// Fails if the rewritten code is not consistent anymore, or if narrowing
    /// breaks one of its invariants.
    pub fn devirtualize(&self, context: &Method, code: &mut Code) -> AnalysisResult<DevirtStats> {
        let analysis = TypeAnalysis::new(self.repo, self.options);
        let mut rewriting = Rewriting::default();

        let instrs: Vec<InstrId> = code
            .topologically_sorted_blocks()
            .into_iter()
            .flat_map(|block| code.block(block).instructions().to_vec())
            .collect();

        for instr in instrs {
            if code.instr(instr).block().is_none() {
                continue;
            }
            match code.instr(instr).kind().clone() {
                InstrKind::AssumeNonNull {
                    origin: Some(origin),
                } => self.rewire_assumption(code, instr, origin, &mut rewriting),
                InstrKind::Invoke {
                    kind: InvokeKind::Virtual,
                    ..
                } if self.options.rebinds_virtual_invokes() => {
                    self.rebind(context, code, instr, &analysis, &mut rewriting)?;
                }
                InstrKind::Invoke {
                    kind: InvokeKind::Interface,
                    ..
                } if self.options.devirtualizes_interface_invokes() => {
                    self.devirtualize_invoke(context, code, instr, &analysis, &mut rewriting)?;
                }
                _ => (),
            }
        }

        if !rewriting.affected.is_empty() {
            analysis.narrow(code, std::mem::take(&mut rewriting.affected))?;
        }
        code.is_consistent_ssa()?;

        if !rewriting.stats.is_empty() {
            log::debug!("{}: {}", context.descriptor(), rewriting.stats);
        }
        Ok(rewriting.stats)
    }

    /// Rebinds an `invoke-virtual` to the method its refined receiver type
    /// dispatches to.
    fn rebind(
        &self,
        context: &Method,
        code: &mut Code,
        invoke: InstrId,
        analysis: &TypeAnalysis,
        rewriting: &mut Rewriting,
    ) -> AnalysisResult<()> {
        let Some(method) = code.instr(invoke).kind().invoked_method().cloned() else {
            return Ok(());
        };
        let Some(refined) = analysis.refined_receiver_type(code, invoke) else {
            return Ok(());
        };
        if refined == method.definer() {
            return Ok(());
        }

        let Some(original) = self
            .repo
            .resolve_method_on_class(method.definer(), &method)
            .single_target()
        else {
            return Ok(());
        };
        let Some(target) = self
            .repo
            .resolve_method_on_class(&refined, &method)
            .single_target()
        else {
            return Ok(());
        };
        if target == original {
            return Ok(());
        }

        let target_method = &self.repo[target];
        let original_method = &self.repo[original];
        if !target_method.is_virtual()
            || !original_method.is_virtual()
            || self.repo.is_interface(target_method.definer()) != Some(false)
            || self.repo.is_interface(original_method.definer()) != Some(false)
        {
            return Ok(());
        }
        if !self
            .repo
            .class_is_visible(context.definer(), target_method.definer())
            || !self.repo.method_is_accessible(context.definer(), target)
        {
            log::trace!("{} is not accessible from {}", target_method.descriptor(), context.definer());
            return Ok(());
        }

        log::trace!("rebinding {method} to {}", target_method.descriptor());
        code.replace_instruction(
            invoke,
            InstrKind::Invoke {
                kind: InvokeKind::Virtual,
                method: target_method.descriptor().clone(),
            },
        )?;
        rewriting.stats.rebound += 1;
        Ok(())
    }

    /// Turns an `invoke-interface` with a single possible target into an
    /// `invoke-virtual` of that target, casting the receiver when its type is
    /// not already a subtype of the target holder.
    fn devirtualize_invoke(
        &self,
        context: &Method,
        code: &mut Code,
        invoke: InstrId,
        analysis: &TypeAnalysis,
        rewriting: &mut Rewriting,
    ) -> AnalysisResult<()> {
        let instr = code.instr(invoke);
        let (Some(method), Some(receiver)) =
            (instr.kind().invoked_method().cloned(), instr.receiver())
        else {
            return Ok(());
        };
        let Some(refined) = analysis.refined_receiver_type(code, invoke) else {
            return Ok(());
        };
        let Some(target) = self.repo.lookup_single_target(&method, &refined) else {
            log::trace!("no single target for {method} on {refined}");
            return Ok(());
        };

        if !self.repo[target].is_virtual() {
            return Ok(());
        }
        let holder = self.repo[target].definer().to_string();
        match self.repo.definition_for(&holder) {
            Some(class) if !class.is_interface() => (),
            _ => return Ok(()),
        }
        if !self.repo.class_is_visible(context.definer(), &holder)
            || !self.repo.method_is_accessible(context.definer(), target)
        {
            log::trace!("{holder} is not accessible from {}", context.definer());
            return Ok(());
        }

        let devirtualized = code.replace_instruction(
            invoke,
            InstrKind::Invoke {
                kind: InvokeKind::Virtual,
                method: method.with_definer(&holder),
            },
        )?;
        log::trace!("{method} devirtualized to {holder}");
        rewriting.devirtualized.insert(devirtualized, invoke);
        rewriting.stats.devirtualized += 1;

        if holder == method.definer() {
            return Ok(());
        }
        let receiver_type = code.type_of(receiver).clone();
        let nullability = receiver_type
            .nullability()
            .unwrap_or(Nullability::MaybeNull);
        let cast_type = TypeElement::class(&holder, nullability);
        if tc!(receiver_type <: &cast_type; self.repo) {
            return Ok(());
        }

        rewriting.affected.extend(code.affected_values(receiver));
        self.cast_receiver(code, devirtualized, receiver, &holder, cast_type, rewriting)
    }

    /// Makes `invoke` use `receiver` cast to `holder`, reusing a dominating
    /// cast if there is one.
    fn cast_receiver(
        &self,
        code: &mut Code,
        invoke: InstrId,
        receiver: ValueId,
        holder: &str,
        cast_type: TypeElement,
        rewriting: &mut Rewriting,
    ) -> AnalysisResult<()> {
        let block = invoke_block(code, invoke)?;
        let has_local_info = code.value(receiver).has_local_info();
        let key = (receiver, holder.to_string());

        if !has_local_info {
            if let Some(cast) = rewriting.casts.get(&key).copied() {
                let dominates = code.definition_block(cast).map_or(false, |cast_block| {
                    rewriting.dominators.get(code).dominated_by(block, cast_block)
                });
                if dominates {
                    log::trace!("reusing {cast} for {invoke}");
                    code.replace_selective_users(
                        receiver,
                        cast,
                        &BTreeSet::from([invoke]),
                        &BTreeMap::new(),
                    );
                    rewriting.stats.casts_reused += 1;
                    return Ok(());
                }
            }
        }

        let anchor = if code.block(block).has_catch_handlers() {
            let anchor = isolate_cast_position(code, invoke)?;
            rewriting.dominators.invalidate();
            anchor
        } else {
            invoke
        };
        let cast = code.create_value(cast_type, None);
        code.insert_instruction_before(
            anchor,
            InstrKind::CheckCast(Type::Class(holder.to_string())),
            vec![receiver],
            Some(cast),
        )?;
        rewriting.stats.casts_inserted += 1;

        if has_local_info {
            code.replace_value_in(invoke, receiver, cast);
        } else {
            code.replace_selective_users(
                receiver,
                cast,
                &BTreeSet::from([invoke]),
                &BTreeMap::new(),
            );
            rewriting.casts.insert(key, cast);
        }
        Ok(())
    }

    /// Makes an assumption on the receiver of a devirtualized invoke refer
    /// to the cast receiver instead.
    fn rewire_assumption(
        &self,
        code: &mut Code,
        assume: InstrId,
        origin: InstrId,
        rewriting: &mut Rewriting,
    ) {
        let Some(old_invoke) = rewriting.devirtualized.get(&origin).copied() else {
            return;
        };
        let (Some(old_receiver), Some(new_receiver)) = (
            code.instr(old_invoke).receiver(),
            code.instr(origin).receiver(),
        ) else {
            return;
        };
        if old_receiver == new_receiver
            || code.value(old_receiver).has_local_info()
            || code.instr(assume).ins().first() != Some(&old_receiver)
        {
            return;
        }
        let new_type = code.type_of(new_receiver);
        if !tc!(new_type <: code.type_of(old_receiver); self.repo) {
            return;
        }
        let (Some(assume_block), Some(invoke_block)) =
            (code.instr(assume).block(), code.instr(origin).block())
        else {
            return;
        };
        if !rewriting
            .dominators
            .get(code)
            .dominated_by(assume_block, invoke_block)
        {
            return;
        }

        code.replace_value_in(assume, old_receiver, new_receiver);
        if let Some(out) = code.instr(assume).out() {
            rewriting.affected.insert(out);
        }
        rewriting.stats.assumes_rewired += 1;
    }
}

fn invoke_block(code: &Code, invoke: InstrId) -> AnalysisResult<BlockId> {
    code.instr(invoke)
        .block()
        .ok_or_else(|| AnalysisError::Internal(format!("{invoke} is detached")))
}

/// Splits the block of `invoke` so that a cast inserted before the returned
/// anchor is the only throwing instruction of its block. Both parts of the
/// split stay covered by the catch handlers of the block.
fn isolate_cast_position(code: &mut Code, invoke: InstrId) -> AnalysisResult<InstrId> {
    let head = invoke_block(code, invoke)?;
    code.split_block_before(invoke)?;

    let instrs = code.block(head).instructions();
    let goto = *instrs
        .last()
        .ok_or_else(|| AnalysisError::Internal(format!("{head} is empty after a split")))?;
    let head_can_throw = instrs
        .iter()
        .any(|instr| code.instr(*instr).kind().can_throw());
    if head_can_throw {
        code.split_block_before(goto)?;
    }
    Ok(goto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{code_of, repo_of};
    use dw_ir::{Program, Value};
    use lazy_static::lazy_static;
    use Nullability::*;

    const PROGRAM: &str = r#"
.class public interface abstract Lp/Shape;
.method public abstract area()D
.end method
.end class

.class public abstract Lp/Base;
.super Ljava/lang/Object;
.implements Lp/Shape;
.method public abstract area()D
.end method
.end class

.class public final Lp/Square;
.super Lp/Base;
.method public area()D
.block B0
    v0[this] = argument
    v1 = const-double 4.0
    return v1
.end method
.end class

.class public final Lp/Circle;
.super Lp/Base;
.method public area()D
.block B0
    v0[this] = argument
    v1 = const-double 3.0
    return v1
.end method
.end class

.class public interface abstract Lp/Drawable;
.method public abstract draw()V
.end method
.end class

.class public Lp/Canvas;
.super Ljava/lang/Object;
.implements Lp/Drawable;
.method public draw()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

.class public interface abstract Lp/Named;
.method public abstract name()Ljava/lang/String;
.end method
.end class

# the superclass comes from a library that is not loaded
.class public Lp/Label;
.super Llib/Widget;
.implements Lp/Named;
.end class

.class public interface abstract Lp/Secret;
.method public abstract reveal()V
.end method
.end class

.class Lq/Hidden;
.super Ljava/lang/Object;
.implements Lp/Secret;
.method public reveal()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

# package-private run is not overridden from another package
.class public Lp/Task;
.super Ljava/lang/Object;
.method run()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

.class public Lq/Job;
.super Lp/Task;
.method public run()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

.class public Lp/Step;
.super Lp/Task;
.method public run()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

.class public Lq/Chore;
.super Lp/Step;
.method public run()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

.class public Lp/Tool;
.super Ljava/lang/Object;
.method public work()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

.class Lq/Gadget;
.super Lp/Tool;
.method public work()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

.class public interface abstract Lp/Runner;
.method public abstract go()V
.end method
.end class

.class public abstract Lp/Engine;
.super Ljava/lang/Object;
.implements Lp/Runner;
.method public go()V
.block B0
    v0[this] = argument
    return-void
.end method
.end class

# the private go is not a dispatch target
.class public final Lp/Turbo;
.super Lp/Engine;
.method private go()V
.block B0
    v0[this] = argument
    return-void
.end method
.method public start()V
.block B0
    v0[this] = argument
    invoke-interface v0 Lp/Runner;->go()V
    return-void
.end method
.end class

.class public Lp/Main;
.super Ljava/lang/Object;

.method public static exact()D
.block B0
    v0 = new-instance Lp/Square;
    invoke-direct v0 Lp/Square;-><init>()V
    v1 = invoke-interface v0 Lp/Shape;->area()D
    return v1
.end method

.method public static twice(Lp/Drawable;)V
.block B0
    v0 = argument
    invoke-interface v0 Lp/Drawable;->draw()V
    invoke-interface v0 Lp/Drawable;->draw()V
    return-void
.end method

.method public static twiceWithLocal(Lp/Drawable;)V
.block B0
    v0[drawable] = argument
    invoke-interface v0 Lp/Drawable;->draw()V
    invoke-interface v0 Lp/Drawable;->draw()V
    return-void
.end method

.method public static branches(Lp/Drawable;I)V
.block B0 -> B1 B2
    v0 = argument
    v1 = argument
    if v1
.block B1 -> B3
    invoke-interface v0 Lp/Drawable;->draw()V
    goto
.block B2 -> B3
    invoke-interface v0 Lp/Drawable;->draw()V
    goto
.block B3
    return-void
.end method

.method public static ambiguous(Lp/Shape;)D
.block B0
    v0 = argument
    v1 = invoke-interface v0 Lp/Shape;->area()D
    return v1
.end method

.method public static unresolved(Lp/Named;)Ljava/lang/String;
.block B0
    v0 = argument
    v1 = invoke-interface v0 Lp/Named;->name()Ljava/lang/String;
    return v1
.end method

.method public static hidden(Lp/Secret;)V
.block B0
    v0 = argument
    invoke-interface v0 Lp/Secret;->reveal()V
    return-void
.end method

.method public static paint(Lp/Drawable;)V
.block B0
    v0 = argument
    i0: invoke-interface v0 Lp/Drawable;->draw()V
    v1 = assume-non-null v0 i0
    v2 = move v1
    v3 = const-string "done"
    return-void
.end method

.method public static guarded(Lp/Drawable;)V
.block B0 -> B1 catch B2
    v0 = argument
    v1 = sget Lp/Main;->count:I
    invoke-interface v0 Lp/Drawable;->draw()V
    goto
.block B1
    return-void
.block B2
    v2 = phi v1
    return-void
.end method

.method public static rebind()D
.block B0
    v0 = new-instance Lp/Square;
    v1 = invoke-virtual v0 Lp/Base;->area()D
    return v1
.end method

.method public static notOverridden()V
.block B0
    v0 = new-instance Lq/Job;
    invoke-virtual v0 Lp/Task;->run()V
    return-void
.end method

.method public static overriddenThroughStep()V
.block B0
    v0 = new-instance Lq/Chore;
    invoke-virtual v0 Lp/Task;->run()V
    return-void
.end method

.method public static invisible(Lq/Gadget;)V
.block B0
    v0 = argument
    invoke-virtual v0 Lp/Tool;->work()V
    return-void
.end method
.end class
"#;

    lazy_static! {
        static ref PROG: Program = dw_ir::parse(PROGRAM).unwrap();
        static ref REPO: Repo = repo_of(&PROG);
    }

    fn method_of(class: &str, name: &str) -> &'static Method {
        REPO.definition_for(class)
            .unwrap()
            .iter_methods(&REPO)
            .find(|method| method.name() == name)
            .unwrap()
    }

    fn method(name: &str) -> &'static Method {
        method_of("p/Main", name)
    }

    fn optimized_in(class: &str, name: &str, options: Options) -> (Code, DevirtStats) {
        let mut code = code_of(&PROG, class, name);
        let stats = crate::optimize(method_of(class, name), &mut code, &REPO, options).unwrap();
        (code, stats)
    }

    fn optimized(name: &str, options: Options) -> (Code, DevirtStats) {
        optimized_in("p/Main", name, options)
    }

    fn casts(code: &Code) -> Vec<InstrId> {
        code.instructions()
            .filter(|instr| instr.kind().is_check_cast())
            .map(|instr| instr.id())
            .collect()
    }

    fn invokes(code: &Code) -> Vec<InstrId> {
        code.instructions()
            .filter(|instr| instr.kind().invoked_method().is_some())
            .map(|instr| instr.id())
            .collect()
    }

    fn v(index: usize) -> ValueId {
        ValueId::from_index(index)
    }

    #[test]
    fn exact_receiver_needs_no_cast() {
        let (code, stats) = optimized("exact", Options::default());
        assert_eq!(
            stats,
            DevirtStats {
                devirtualized: 1,
                ..DevirtStats::default()
            }
        );
        assert!(casts(&code).is_empty());
        assert!(code
            .to_string()
            .contains("v1 = invoke-virtual v0 Lp/Square;->area()D"));
    }

    #[test]
    fn casts_are_inserted_then_reused() {
        let (code, stats) = optimized("twice", Options::default());
        assert_eq!(stats.devirtualized, 2);
        assert_eq!(stats.casts_inserted, 1);
        assert_eq!(stats.casts_reused, 1);

        let printed = code.to_string();
        assert!(printed.contains("v1 = check-cast v0 Lp/Canvas;"));
        assert_eq!(
            printed
                .matches("invoke-virtual v1 Lp/Canvas;->draw()V")
                .count(),
            2
        );
        assert_eq!(code.type_of(v(1)), &TypeElement::class("p/Canvas", MaybeNull));
        // the original receiver keeps its type and loses its users
        assert_eq!(code.type_of(v(0)), &TypeElement::class("p/Drawable", MaybeNull));
        assert_eq!(code.value(v(0)).users().len(), 1);
    }

    #[test]
    fn receivers_with_locals_are_cast_each_time() {
        let (code, stats) = optimized("twiceWithLocal", Options::default());
        assert_eq!(stats.devirtualized, 2);
        assert_eq!(stats.casts_inserted, 2);
        assert_eq!(stats.casts_reused, 0);
        assert_eq!(casts(&code).len(), 2);
        code.is_consistent_ssa().unwrap();
    }

    #[test]
    fn casts_are_not_reused_across_branches() {
        let (code, stats) = optimized("branches", Options::default());
        assert_eq!(stats.devirtualized, 2);
        assert_eq!(stats.casts_inserted, 2);
        assert_eq!(stats.casts_reused, 0);
        for cast in casts(&code) {
            let block = code.instr(cast).block().unwrap();
            assert_ne!(block, code.entry());
        }
    }

    #[test]
    fn ambiguous_targets_are_kept() {
        let original = code_of(&PROG, "p/Main", "ambiguous").to_string();
        let (code, stats) = optimized("ambiguous", Options::default());
        assert!(stats.is_empty());
        assert_eq!(code.to_string(), original);
    }

    #[test]
    fn unresolvable_targets_are_kept() {
        let (code, stats) = optimized("unresolved", Options::default());
        assert!(stats.is_empty());
        assert!(code
            .to_string()
            .contains("invoke-interface v0 Lp/Named;->name()Ljava/lang/String;"));
    }

    #[test]
    fn inaccessible_targets_are_kept() {
        assert_eq!(
            REPO.lookup_single_target(
                &dw_ir::MethodDescr::try_from("Lp/Secret;->reveal()V").unwrap(),
                "p/Secret"
            )
            .map(|uid| REPO[uid].definer().to_string()),
            Some("q/Hidden".to_string())
        );
        let (code, stats) = optimized("hidden", Options::default());
        assert!(stats.is_empty());
        assert!(code.instr(invokes(&code)[0]).kind().is_invoke_interface());
    }

    #[test]
    fn assumptions_follow_the_cast_receiver() {
        let (code, stats) = optimized("paint", Options::default());
        assert_eq!(stats.devirtualized, 1);
        assert_eq!(stats.casts_inserted, 1);
        assert_eq!(stats.assumes_rewired, 1);

        let assume = code
            .instructions()
            .find(|instr| matches!(instr.kind(), InstrKind::AssumeNonNull { .. }))
            .unwrap();
        assert_eq!(assume.ins(), &[v(4)]);
        assert_eq!(
            assume.kind(),
            &InstrKind::AssumeNonNull {
                origin: Some(invokes(&code)[0])
            }
        );

        // users of the assumption are narrowed, unrelated values are not
        let canvas = TypeElement::class("p/Canvas", DefinitelyNotNull);
        assert_eq!(code.type_of(v(1)), &canvas);
        assert_eq!(code.type_of(v(2)), &canvas);
        assert_eq!(code.type_of(v(0)), &TypeElement::class("p/Drawable", MaybeNull));
        assert_eq!(
            code.type_of(v(3)),
            &TypeElement::class("java/lang/String", DefinitelyNotNull)
        );
    }

    #[test]
    fn casts_get_their_own_block_under_catch_handlers() {
        let (code, stats) = optimized("guarded", Options::default());
        assert_eq!(stats.casts_inserted, 1);
        code.is_consistent_ssa().unwrap();
        assert_eq!(code.blocks_count(), 5);

        let cast = casts(&code)[0];
        let cast_block = code.block(code.instr(cast).block().unwrap());
        assert!(cast_block.has_catch_handlers());
        let throwing = cast_block
            .instructions()
            .iter()
            .filter(|instr| code.instr(**instr).kind().can_throw())
            .count();
        assert_eq!(throwing, 1);

        let invoke = code.instr(invokes(&code)[0]);
        assert!(invoke.kind().is_invoke_virtual());
        assert_ne!(invoke.block(), Some(cast_block.id()));
        assert_eq!(invoke.receiver(), code.instr(cast).out());

        let handler = code.block(BlockId::from_index(2));
        assert_eq!(handler.predecessors().len(), 3);
        let phi = handler.phis()[0];
        assert_eq!(code.phi_operands(phi), &[v(1), v(1), v(1)]);
    }

    #[test]
    fn virtual_invokes_are_rebound() {
        let (code, stats) = optimized("rebind", Options::default());
        assert_eq!(
            stats,
            DevirtStats {
                rebound: 1,
                ..DevirtStats::default()
            }
        );
        assert!(code
            .to_string()
            .contains("v1 = invoke-virtual v0 Lp/Square;->area()D"));

        let options = Options::default().dont_rebind_virtual_invokes();
        let (code, stats) = optimized("rebind", options);
        assert!(stats.is_empty());
        assert!(code.to_string().contains("invoke-virtual v0 Lp/Base;->area()D"));
    }

    #[test]
    fn package_private_methods_are_not_rebound_across_packages() {
        let (code, stats) = optimized("notOverridden", Options::default());
        assert!(stats.is_empty(), "{stats}");
        assert!(code.to_string().contains("invoke-virtual v0 Lp/Task;->run()V"));

        // an overrider in the package of Task makes the later ones overriders
        let (code, stats) = optimized("overriddenThroughStep", Options::default());
        assert_eq!(stats.rebound, 1);
        assert!(code.to_string().contains("invoke-virtual v0 Lq/Chore;->run()V"));
    }

    #[test]
    fn invisible_rebind_targets_are_kept() {
        let tool_work = dw_ir::MethodDescr::try_from("Lp/Tool;->work()V").unwrap();
        assert_eq!(
            REPO.resolve_method_on_class("q/Gadget", &tool_work)
                .single_target()
                .map(|uid| REPO[uid].definer().to_string()),
            Some("q/Gadget".to_string())
        );
        let (code, stats) = optimized("invisible", Options::default());
        assert!(stats.is_empty(), "{stats}");
        assert!(code.to_string().contains("invoke-virtual v0 Lp/Tool;->work()V"));
    }

    #[test]
    fn private_methods_are_not_targets() {
        let (code, stats) = optimized_in("p/Turbo", "start", Options::default());
        assert_eq!(
            stats,
            DevirtStats {
                devirtualized: 1,
                ..DevirtStats::default()
            }
        );
        assert!(casts(&code).is_empty());
        let printed = code.to_string();
        assert!(printed.contains("invoke-virtual v0 Lp/Engine;->go()V"));
        assert!(!printed.contains("Lp/Turbo;->go()V"));
    }

    #[test]
    fn interface_rewrites_can_be_disabled() {
        let options = Options::default().dont_devirtualize_interface_invokes();
        let (code, stats) = optimized("twice", options);
        assert!(stats.is_empty());
        assert!(casts(&code).is_empty());
    }

    #[test]
    fn second_pass_changes_nothing() {
        for name in ["exact", "twice", "paint", "guarded", "rebind", "overriddenThroughStep"] {
            let (mut code, _) = optimized(name, Options::default());
            let printed = code.to_string();
            let instructions = code.instructions_count();
            let types: Vec<TypeElement> = code.values().map(Value::type_).cloned().collect();

            let stats = Devirtualizer::new(&REPO, Options::default())
                .devirtualize(method(name), &mut code)
                .unwrap();
            assert!(stats.is_empty(), "{name}: {stats}");
            assert_eq!(code.instructions_count(), instructions);
            assert_eq!(code.to_string(), printed);
            let retyped: Vec<TypeElement> = code.values().map(Value::type_).cloned().collect();
            assert_eq!(retyped, types);
        }
    }
}
