//! A repository to centralize application and dependencies classes.

use crate::errors::AnalysisResult;
use crate::hierarchy::Hierarchy;
use crate::repo::*;
use dw_ir::types::{package_name, JAVA_LANG_OBJECT};
use dw_ir::{ClassDef, MethodDescr, Program};
use lazy_static::lazy_static;
use std::collections::BTreeSet;
use std::ops;

lazy_static! {
    // Virtual methods every class inherits from java.lang.Object.
    static ref OBJECT_METHODS: BTreeSet<&'static str> = [
        "clone", "equals", "finalize", "getClass", "hashCode", "notify", "notifyAll", "toString",
        "wait",
    ]
    .into_iter()
    .collect();
}

/// Outcome of a method resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Nothing matches, or some class on the way is unknown.
    NoTarget,
    SingleTarget(MethodUid),
    /// Several maximally specific default methods match.
    Ambiguous,
}

impl ResolutionResult {
    #[must_use]
    pub const fn single_target(self) -> Option<MethodUid> {
        if let Self::SingleTarget(uid) = self {
            Some(uid)
        } else {
            None
        }
    }
}

#[derive(Debug, Default)]
pub struct Repo {
    hierarchy: Hierarchy,
    counters: RepoCounters,
    methods: Vec<Method>,
}

impl ops::Index<MethodUid> for Repo {
    type Output = Method;

    fn index(&self, muid: MethodUid) -> &Method {
        &self.methods[muid.idx()]
    }
}

impl Repo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            hierarchy: Hierarchy::new(),
            counters: RepoCounters::new(),
            methods: Vec::new(),
        }
    }

    pub fn register_program(&mut self, program: &Program, is_system: bool) -> AnalysisResult<()> {
        for class_def in &program.classes {
            self.register_class(class_def, is_system)?;
        }
        Ok(())
    }

    fn register_class(&mut self, class_def: &ClassDef, is_system: bool) -> AnalysisResult<()> {
        let class_name = &class_def.name;
        log::trace!(
            "pushing '{}'{} in repository",
            class_name,
            if is_system { " (SYS)" } else { "" }
        );

        let mut uid_to_update = None;
        if let Some(class_h) = self.hierarchy.get_class(class_name) {
            if class_h.is_defined() {
                log::warn!(
                    "class '{}'{} has already been pushed in repository",
                    class_name,
                    if is_system { " (SYS)" } else { "" }
                );
                // no change of the hierarchy nor of the repository for this class
                return Ok(());
            }
            uid_to_update = Some(class_h.uid());
        }

        let class = Class::new(
            uid_to_update.unwrap_or_else(|| self.counters.new_class_uid()),
            class_def,
            is_system,
            &mut self.counters,
            &mut self.methods,
        );
        if uid_to_update.is_some() {
            self.hierarchy.update_class(class)?;
        } else {
            self.hierarchy.insert_class(class)?;
        }

        // filling in the hierarchy links
        if let Some(superclass_name) = &class_def.superclass {
            self.ensure_class(superclass_name)?;
            self.hierarchy.insert_extends(class_name, superclass_name)?;
        }
        for interface_name in &class_def.interfaces {
            self.ensure_class(interface_name)?;
            self.hierarchy
                .insert_implements(class_name, interface_name)?;
        }

        Ok(())
    }

    fn ensure_class(&mut self, name: &str) -> AnalysisResult<()> {
        if !self.hierarchy.contains_class(name) {
            self.hierarchy
                .insert_class(Class::new_no_def(self.counters.new_class_uid(), name))?;
        }
        Ok(())
    }

    pub fn close_hierarchy(&mut self) -> AnalysisResult<()> {
        self.hierarchy.close(&mut self.counters)
    }

    #[inline]
    #[must_use]
    pub const fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    #[inline]
    pub fn iter_classes(&self) -> impl Iterator<Item = &Class> {
        self.hierarchy.iter_classes()
    }

    pub fn iter_missing_classes(&self) -> impl Iterator<Item = &str> {
        self.hierarchy
            .iter_classes()
            .filter_map(|class| (!class.is_defined()).then(|| class.name()))
    }

    pub fn get_class_by_name(&self, name: &str) -> Option<&Class> {
        self.hierarchy.get_class(name)
    }

    /// Returns the class only if its definition is known.
    pub fn definition_for(&self, name: &str) -> Option<&Class> {
        self.get_class_by_name(name)
            .filter(|class| class.is_defined())
    }

    /// `None` when the class definition is unknown.
    #[must_use]
    pub fn is_interface(&self, name: &str) -> Option<bool> {
        self.definition_for(name).map(Class::is_interface)
    }

    pub fn iter_classes_methods(&self) -> impl Iterator<Item = (&Class, &Method)> {
        self.iter_classes()
            .flat_map(move |class| class.iter_methods(self).map(move |method| (class, method)))
    }

    /// Finds the method declared by the holder named in `descriptor`.
    pub fn find_method_by_descriptor(&self, descriptor: &MethodDescr) -> Option<&Method> {
        self.definition_for(descriptor.definer())?
            .get_method(descriptor, self)
    }

    #[must_use]
    pub fn supertypes(&self, name: &str) -> BTreeSet<String> {
        self.hierarchy.supertypes(name)
    }

    #[must_use]
    pub fn subtypes(&self, name: &str) -> BTreeSet<String> {
        self.hierarchy.subtypes(name)
    }

    /// Checks whether an object of type `type_name1` can be used where a
    /// `type_name2` is expected.
    ///
    /// Every type is typeable as itself and as `java/lang/Object`, even when
    /// absent from the repository. Otherwise an inheritance path from
    /// `type_name1` to `type_name2` must exist, which conservatively fails
    /// for unknown classes.
    #[must_use]
    pub fn is_typeable_as(&self, type_name1: &str, type_name2: &str) -> bool {
        if type_name1 == type_name2 || type_name2 == JAVA_LANG_OBJECT {
            return true;
        }
        self.supertypes(type_name1).contains(type_name2)
    }

    /// Resolves the method matching the signature of `descriptor` as the
    /// virtual machine would for an object whose class is `class_name`.
    ///
    /// The superclass chain is looked up first, then the maximally specific
    /// default methods of the super interfaces. Only methods taking part in
    /// virtual dispatch and overriding the referenced method are selected.
    /// An unknown class met on the way makes the resolution fail.
    #[must_use]
    pub fn resolve_method_on_class(
        &self,
        class_name: &str,
        descriptor: &MethodDescr,
    ) -> ResolutionResult {
        let declared = self.declared_method(descriptor);

        // matching methods, most specific first, up to the declared one
        let mut chain = Vec::new();
        let mut current = Some(class_name);
        while let Some(name) = current {
            let Some(class) = self.definition_for(name) else {
                // the root class may be missing when no library is given
                if name == JAVA_LANG_OBJECT && !OBJECT_METHODS.contains(descriptor.name()) {
                    break;
                }
                log::trace!("resolution of {descriptor} stopped at unknown class {name}");
                return ResolutionResult::NoTarget;
            };
            if let Some(method) = class
                .get_method(descriptor, self)
                .filter(|method| method.is_virtual())
            {
                chain.push(method);
                let complete = declared.map_or(true, |declared| {
                    declared.uid() == method.uid()
                        || declared.is_public()
                        || declared.is_protected()
                });
                if complete {
                    break;
                }
            }
            current = class.superclass();
        }
        if !chain.is_empty() {
            return select_overrider(&chain, declared)
                .map_or(ResolutionResult::NoTarget, |method| {
                    ResolutionResult::SingleTarget(method.uid())
                });
        }

        let mut candidates = Vec::new();
        for name in self.supertypes(class_name) {
            if name == JAVA_LANG_OBJECT {
                continue;
            }
            let Some(class) = self.definition_for(&name) else {
                return ResolutionResult::NoTarget;
            };
            if !class.is_interface() {
                continue;
            }
            if let Some(method) = class.get_method(descriptor, self) {
                if !method.is_abstract() && method.is_virtual() {
                    candidates.push(method);
                }
            }
        }
        let maximally_specific: Vec<&Method> = candidates
            .iter()
            .filter(|method| {
                !candidates.iter().any(|other| {
                    other.definer() != method.definer()
                        && self.is_typeable_as(other.definer(), method.definer())
                })
            })
            .copied()
            .collect();

        match maximally_specific.as_slice() {
            [] => ResolutionResult::NoTarget,
            [method] => ResolutionResult::SingleTarget(method.uid()),
            _ => ResolutionResult::Ambiguous,
        }
    }

    /// Closed-world lookup of the method invoked on a receiver of type
    /// `receiver`: every concrete subtype must dispatch to the same method.
    #[must_use]
    pub fn lookup_single_target(
        &self,
        descriptor: &MethodDescr,
        receiver: &str,
    ) -> Option<MethodUid> {
        self.definition_for(receiver)?;

        let mut target = None;
        for name in self.subtypes(receiver) {
            let class = self.definition_for(&name)?;
            if !class.is_concrete() {
                continue;
            }
            let uid = self
                .resolve_method_on_class(&name, descriptor)
                .single_target()?;
            match target {
                None => target = Some(uid),
                Some(previous) if previous == uid => (),
                Some(_) => {
                    log::trace!("several targets for {descriptor} on {receiver}");
                    return None;
                }
            }
        }
        target.filter(|uid| !self[*uid].is_abstract())
    }

    /// The method `descriptor` designates, looked up along the superclass
    /// chain of its holder.
    fn declared_method(&self, descriptor: &MethodDescr) -> Option<&Method> {
        let mut current = Some(descriptor.definer());
        while let Some(name) = current {
            let class = self.definition_for(name)?;
            if let Some(method) = class
                .get_method(descriptor, self)
                .filter(|method| method.is_virtual())
            {
                return Some(method);
            }
            current = class.superclass();
        }
        None
    }

    /// Visibility of a class from the code of another one.
    #[must_use]
    pub fn class_is_visible(&self, context: &str, holder: &str) -> bool {
        let Some(class) = self.definition_for(holder) else {
            return false;
        };
        context == holder || class.is_public() || package_name(context) == package_name(holder)
    }

    /// Checks that the code of class `context` may invoke `target`.
    #[must_use]
    pub fn method_is_accessible(&self, context: &str, target: MethodUid) -> bool {
        let method = &self[target];
        let holder = method.definer();
        if holder == context {
            return true;
        }
        let Some(class) = self.definition_for(holder) else {
            return false;
        };
        if package_name(context) == package_name(holder) {
            !method.is_private()
        } else {
            class.is_public() && method.is_public()
        }
    }

    pub fn nb_classes(&self) -> usize {
        self.counters.nb_classes()
    }

    pub fn nb_methods(&self) -> usize {
        self.counters.nb_methods()
    }
}

/// Selects, in a superclass chain ordered from the most specific class, the
/// lowest method that overrides `declared`, directly or through another
/// overrider. Without a declared method, the top of the chain is the root.
fn select_overrider<'r>(
    chain: &[&'r Method],
    declared: Option<&'r Method>,
) -> Option<&'r Method> {
    let root = declared.or_else(|| chain.last().copied())?;
    let mut overriders = vec![root];
    let mut selected = None;
    for method in chain.iter().rev() {
        if method.uid() == root.uid() || overriders.iter().any(|other| method.overrides(other))
        {
            overriders.push(*method);
            selected = Some(*method);
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use dw_ir::Type;

    const HIERARCHY: &str = r#"
.class public Ljava/lang/Object;
.method public toString()Ljava/lang/String;
.end method
.end class

.class public interface abstract Lp/Shape;
.method public abstract area()D
.end method
.method public describe()Ljava/lang/String;
.block B0
    v0 = argument
    v1 = const-string "shape"
    return v1
.end method
.end class

.class public interface abstract Lp/Named;
.implements Lp/Shape;
.method public describe()Ljava/lang/String;
.block B0
    v0 = argument
    v1 = const-string "named"
    return v1
.end method
.end class

.class public abstract Lp/Base;
.super Ljava/lang/Object;
.implements Lp/Shape;
.method public area()D
.block B0
    v0 = argument
    v1 = const-double 0.0
    return v1
.end method
.end class

.class public final Lp/Square;
.super Lp/Base;
.implements Lp/Named;
.method public static area()D
.end method
.end class

.class public final Lp/Circle;
.super Lp/Base;
.method public area()D
.block B0
    v0 = argument
    v1 = const-double 3.14
    return v1
.end method
.method private secret()V
.end method
.end class

.class Lq/Hidden;
.super Lp/Base;
.end class

.class public Lq/Orphan;
.super Lr/Missing;
.end class

.class public Lp/Task;
.super Ljava/lang/Object;
.method run()V
.end method
.end class

.class public Lp/Step;
.super Lp/Task;
.method public run()V
.end method
.end class

.class public Lq/Job;
.super Lp/Task;
.method public run()V
.end method
.end class

.class public Lq/Chore;
.super Lp/Step;
.method public run()V
.end method
.end class
"#;

    fn repo() -> Repo {
        let program = dw_ir::parse(HIERARCHY).unwrap();
        let mut repo = Repo::new();
        repo.register_program(&program, false).unwrap();
        repo.close_hierarchy().unwrap();
        repo
    }

    fn area(definer: &str) -> MethodDescr {
        MethodDescr::new(definer, "area", vec![], Type::Double)
    }

    fn describe(definer: &str) -> MethodDescr {
        MethodDescr::new(definer, "describe", vec![], Type::class("java/lang/String"))
    }

    #[test]
    fn subtyping() {
        let repo = repo();
        assert!(repo.is_typeable_as("p/Square", "p/Shape"));
        assert!(repo.is_typeable_as("p/Square", "p/Named"));
        assert!(!repo.is_typeable_as("p/Circle", "p/Named"));
        assert!(repo.is_typeable_as("x/Unknown", "java/lang/Object"));
        assert!(!repo.is_typeable_as("x/Unknown", "p/Shape"));
        assert_eq!(
            repo.supertypes("x/Unknown"),
            BTreeSet::from(["x/Unknown".to_string(), "java/lang/Object".to_string()])
        );
        assert!(repo.subtypes("p/Base").contains("q/Hidden"));
        assert_eq!(repo.is_interface("p/Shape"), Some(true));
        assert_eq!(repo.is_interface("r/Missing"), None);
        assert_eq!(repo.iter_missing_classes().collect::<Vec<_>>(), vec!["r/Missing"]);
    }

    #[test]
    fn resolution() {
        let repo = repo();
        let base_area = repo.find_method_by_descriptor(&area("p/Base")).unwrap().uid();
        let circle_area = repo.find_method_by_descriptor(&area("p/Circle")).unwrap().uid();

        // the static area of Square does not take part in dispatch
        assert_eq!(
            repo.resolve_method_on_class("p/Square", &area("p/Shape")),
            ResolutionResult::SingleTarget(base_area)
        );
        assert_eq!(
            repo.resolve_method_on_class("p/Circle", &area("p/Shape")),
            ResolutionResult::SingleTarget(circle_area)
        );
        // Named overrides the default method of Shape
        let named_describe = repo
            .find_method_by_descriptor(&describe("p/Named"))
            .unwrap()
            .uid();
        assert_eq!(
            repo.resolve_method_on_class("p/Square", &describe("p/Shape")),
            ResolutionResult::SingleTarget(named_describe)
        );
        assert_eq!(
            repo.resolve_method_on_class("q/Orphan", &area("p/Shape")),
            ResolutionResult::NoTarget
        );
    }

    #[test]
    fn package_private_overrides() {
        let repo = repo();
        let run = |definer: &str| MethodDescr::new(definer, "run", vec![], Type::Void);
        let uid = |definer: &str| repo.find_method_by_descriptor(&run(definer)).unwrap().uid();

        // Job is out of the package of Task
        assert_eq!(
            repo.resolve_method_on_class("q/Job", &run("p/Task")),
            ResolutionResult::SingleTarget(uid("p/Task"))
        );
        assert_eq!(
            repo.resolve_method_on_class("q/Job", &run("q/Job")),
            ResolutionResult::SingleTarget(uid("q/Job"))
        );
        // Chore overrides Task.run through Step.run
        assert_eq!(
            repo.resolve_method_on_class("q/Chore", &run("p/Task")),
            ResolutionResult::SingleTarget(uid("q/Chore"))
        );
        assert_eq!(
            repo.resolve_method_on_class("p/Step", &run("p/Task")),
            ResolutionResult::SingleTarget(uid("p/Step"))
        );

        let task_run = &repo[uid("p/Task")];
        assert!(repo[uid("p/Step")].overrides(task_run));
        assert!(!repo[uid("q/Job")].overrides(task_run));
        assert!(!task_run.overrides(task_run));
    }

    #[test]
    fn single_target_lookup() {
        let repo = repo();
        // Square, Circle and Hidden do not agree
        assert_eq!(repo.lookup_single_target(&area("p/Shape"), "p/Base"), None);
        let circle_area = repo.find_method_by_descriptor(&area("p/Circle")).unwrap().uid();
        assert_eq!(
            repo.lookup_single_target(&area("p/Shape"), "p/Circle"),
            Some(circle_area)
        );
        assert_eq!(repo.lookup_single_target(&area("p/Shape"), "r/Missing"), None);
    }

    #[test]
    fn visibility() {
        let repo = repo();
        assert!(!repo.class_is_visible("p/Square", "q/Hidden"));
        assert!(repo.class_is_visible("q/Other", "q/Hidden"));
        assert!(repo.class_is_visible("z/Z", "p/Circle"));
        assert!(!repo.class_is_visible("z/Z", "r/Missing"));

        let circle = repo.definition_for("p/Circle").unwrap();
        let secret = circle
            .iter_methods(&repo)
            .find(|method| method.name() == "secret")
            .unwrap()
            .uid();
        assert!(repo.method_is_accessible("p/Circle", secret));
        assert!(!repo.method_is_accessible("p/Square", secret));
        let area = repo.find_method_by_descriptor(&area("p/Circle")).unwrap().uid();
        assert!(repo.method_is_accessible("z/Z", area));
    }
}
