use crate::repo::{ClassUid, MethodUid};
use dw_ir::flags::MethodFlags;
use dw_ir::types::package_name;
use dw_ir::{MethodDef, MethodDescr, Type};
use std::fmt;

/// The enriched method definition.
#[derive(Debug, Clone)]
pub struct Method {
    // Unique identifier in the repository
    uid: MethodUid,
    // Identifier of the declaring class
    class: ClassUid,
    // Names and types that identify the method
    descriptor: MethodDescr,
    flags: MethodFlags,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.descriptor)
    }
}

impl Method {
    pub(crate) fn new(uid: MethodUid, class: ClassUid, method_def: &MethodDef) -> Self {
        Self {
            uid,
            class,
            descriptor: method_def.descriptor.clone(),
            flags: method_def.flags,
        }
    }

    #[inline]
    #[must_use]
    pub const fn uid(&self) -> MethodUid {
        self.uid
    }

    #[inline]
    #[must_use]
    pub const fn class_uid(&self) -> ClassUid {
        self.class
    }

    #[inline]
    #[must_use]
    pub const fn descriptor(&self) -> &MethodDescr {
        &self.descriptor
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Internal name of the declaring class.
    #[inline]
    #[must_use]
    pub fn definer(&self) -> &str {
        self.descriptor.definer()
    }

    #[inline]
    #[must_use]
    pub fn return_type(&self) -> &Type {
        self.descriptor.return_type()
    }

    #[inline]
    #[must_use]
    pub fn parameters_types(&self) -> &[Type] {
        self.descriptor.parameters_types()
    }

    #[inline]
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_PUBLIC)
    }

    #[inline]
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_PROTECTED)
    }

    #[inline]
    #[must_use]
    pub const fn is_private(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_PRIVATE)
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_STATIC)
    }

    #[inline]
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_ABSTRACT)
    }

    #[inline]
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_CONSTRUCTOR) || self.descriptor.is_constructor()
    }

    /// Methods that take part in virtual dispatch.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        !self.is_private() && !self.is_static() && !self.is_constructor()
    }

    /// Checks that `self` directly overrides `other`: a package-private
    /// method is only overridden from its own package.
    #[must_use]
    pub fn overrides(&self, other: &Self) -> bool {
        self.uid != other.uid
            && self.is_virtual()
            && other.is_virtual()
            && self.descriptor.same_signature(&other.descriptor)
            && (other.is_public()
                || other.is_protected()
                || package_name(self.definer()) == package_name(other.definer()))
    }
}
