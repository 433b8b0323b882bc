use dw_ir::lattice::TypeElement;
use std::collections::BTreeMap;

/// Argument types observed at every call site of a method.
///
/// A bound replaces the declared type of an argument when it is more
/// precise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSiteOptimizationInfo {
    bounds: BTreeMap<usize, TypeElement>,
}

impl CallSiteOptimizationInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the bound of argument `index`, the receiver being argument 0
    /// for instance methods.
    #[must_use]
    pub fn with_argument(mut self, index: usize, bound: TypeElement) -> Self {
        self.bounds.insert(index, bound);
        self
    }

    #[must_use]
    pub fn argument_bound(&self, index: usize) -> Option<&TypeElement> {
        self.bounds.get(&index)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}
