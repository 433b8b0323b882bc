/// Switches of the type analysis and devirtualization passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    allow_imprecise_types: bool,
    rebind_virtual_invokes: bool,
    devirtualize_interface_invokes: bool,
}

/// Default values forbid imprecise types and enable every rewrite.
impl Default for Options {
    fn default() -> Self {
        Self {
            allow_imprecise_types: false,
            rebind_virtual_invokes: true,
            devirtualize_interface_invokes: true,
        }
    }
}

impl Options {
    /// Tolerates values typed `⊤` after widening, for code whose arguments
    /// were seeded from partial information.
    #[must_use]
    pub const fn allow_imprecise_types(mut self) -> Self {
        self.allow_imprecise_types = true;
        self
    }

    /// Leaves `invoke-virtual` instructions untouched.
    #[must_use]
    pub const fn dont_rebind_virtual_invokes(mut self) -> Self {
        self.rebind_virtual_invokes = false;
        self
    }

    /// Leaves `invoke-interface` instructions untouched.
    #[must_use]
    pub const fn dont_devirtualize_interface_invokes(mut self) -> Self {
        self.devirtualize_interface_invokes = false;
        self
    }

    #[inline]
    #[must_use]
    pub const fn imprecise_types_allowed(&self) -> bool {
        self.allow_imprecise_types
    }

    #[inline]
    #[must_use]
    pub const fn rebinds_virtual_invokes(&self) -> bool {
        self.rebind_virtual_invokes
    }

    #[inline]
    #[must_use]
    pub const fn devirtualizes_interface_invokes(&self) -> bool {
        self.devirtualize_interface_invokes
    }
}
