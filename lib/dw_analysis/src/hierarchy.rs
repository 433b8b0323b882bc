//! Classes hierarchy graph representation.

use crate::errors::{AnalysisError, AnalysisResult};
use crate::repo::{Class, RepoCounters};
use dw_ir::types::JAVA_LANG_OBJECT;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet};
use Direction::Outgoing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inheritance {
    Extends,
    Implements,
}

/// Edges go from a class to its direct super types.
#[derive(Debug, Default)]
pub struct Hierarchy {
    inner: DiGraph<Class, Inheritance>,
    node_ids: BTreeMap<String, NodeIndex>,
}

impl Hierarchy {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_class(&mut self, class: Class) -> AnalysisResult<()> {
        if self.node_ids.contains_key(class.name()) {
            return Err(AnalysisError::Internal(
                "duplicate object in hierarchy graph".to_string(),
            ));
        }

        let class_name = class.name().to_string();
        let id = self.inner.add_node(class);
        self.node_ids.insert(class_name, id);
        Ok(())
    }

    pub(crate) fn update_class(&mut self, class: Class) -> AnalysisResult<()> {
        if let Some(id) = self.node_ids.get(class.name()) {
            self.inner[*id] = class;
            Ok(())
        } else {
            Err(AnalysisError::ClassNotFound(class.name().to_string()))
        }
    }

    pub(crate) fn contains_class(&self, class_name: &str) -> bool {
        self.node_ids.contains_key(class_name)
    }

    pub fn iter_classes(&self) -> impl Iterator<Item = &Class> {
        self.inner.node_weights()
    }

    pub(crate) fn insert_extends(&mut self, class: &str, superclass: &str) -> AnalysisResult<()> {
        self.insert_link(class, superclass, Inheritance::Extends)
    }

    pub(crate) fn insert_implements(&mut self, class: &str, interface: &str) -> AnalysisResult<()> {
        self.insert_link(class, interface, Inheritance::Implements)
    }

    fn insert_link(&mut self, from: &str, to: &str, link: Inheritance) -> AnalysisResult<()> {
        let src = self
            .node_ids
            .get(from)
            .ok_or_else(|| AnalysisError::ClassNotFound(from.to_string()))?;
        let dst = self
            .node_ids
            .get(to)
            .ok_or_else(|| AnalysisError::ClassNotFound(to.to_string()))?;
        self.inner.update_edge(*src, *dst, link);
        Ok(())
    }

    pub(crate) fn close(&mut self, counters: &mut RepoCounters) -> AnalysisResult<()> {
        if !self.contains_class(JAVA_LANG_OBJECT) {
            self.insert_class(Class::new_no_def(
                counters.new_class_uid(),
                JAVA_LANG_OBJECT,
            ))?;
        }

        let orphans: Vec<String> = self
            .inner
            .externals(Outgoing)
            .map(|id| self.inner[id].name().to_string())
            .filter(|name| name != JAVA_LANG_OBJECT)
            .collect();

        for name in orphans {
            log::warn!("add missing java.lang.Object inheritance to {name}");
            self.insert_extends(&name, JAVA_LANG_OBJECT)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get_class(&self, class_name: &str) -> Option<&Class> {
        self.node_ids.get(class_name).map(|id| &self.inner[*id])
    }

    /// Names of the class and of all its direct and indirect super types.
    /// The root class is always part of the result, even for unknown classes.
    #[must_use]
    pub fn supertypes(&self, class_name: &str) -> BTreeSet<String> {
        let mut parents = BTreeSet::from([class_name.to_string(), JAVA_LANG_OBJECT.to_string()]);
        if let Some(id) = self.node_ids.get(class_name) {
            let mut dfs = Dfs::new(&self.inner, *id);
            while let Some(id) = dfs.next(&self.inner) {
                parents.insert(self.inner[id].name().to_string());
            }
        }
        parents
    }

    /// Names of the class and of all its direct and indirect sub types.
    #[must_use]
    pub fn subtypes(&self, class_name: &str) -> BTreeSet<String> {
        let mut children = BTreeSet::from([class_name.to_string()]);
        if let Some(id) = self.node_ids.get(class_name) {
            let reversed = Reversed(&self.inner);
            let mut dfs = Dfs::new(reversed, *id);
            while let Some(id) = dfs.next(reversed) {
                children.insert(self.inner[id].name().to_string());
            }
        }
        children
    }
}
