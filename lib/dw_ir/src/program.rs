//! Classes and methods of a whole program.

use crate::code::Code;
use crate::descriptors::MethodDescr;
use crate::flags::{ClassFlags, MethodFlags};

/// A set of class definitions, as read from one textual file.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub classes: Vec<ClassDef>,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub name: String,
    pub flags: ClassFlags,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub descriptor: MethodDescr,
    pub flags: MethodFlags,
    /// SSA body, abstract and native methods have none.
    pub code: Option<Code>,
}

impl Program {
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|class| class.name == name)
    }

    /// Iterates over every method having a body, along with its class.
    pub fn methods_with_code(&self) -> impl Iterator<Item = (&ClassDef, &MethodDef)> {
        self.classes.iter().flat_map(|class| {
            class
                .methods
                .iter()
                .filter(|method| method.code.is_some())
                .map(move |method| (class, method))
        })
    }
}

impl ClassDef {
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::ACC_INTERFACE)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|method| method.descriptor.name() == name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut MethodDef> {
        self.methods
            .iter_mut()
            .find(|method| method.descriptor.name() == name)
    }
}

impl MethodDef {
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_STATIC)
    }
}
