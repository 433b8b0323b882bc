use crate::repo::*;
use dw_ir::flags::ClassFlags;
use dw_ir::ClassDef;
use std::cmp::Ordering;
use std::fmt;

/// The enriched class definition.
#[derive(Debug, Clone)]
pub struct Class {
    // Unique identifier in the repository
    uid: ClassUid,
    // Cache of name that identify the class
    name: String,
    // Access flags, none when the class is only referenced
    flags: Option<ClassFlags>,
    // Flag to indicate that the class comes from libraries and not from the analyzed program
    system: bool,
    superclass: Option<String>,
    // List of contained methods (declaration level)
    methods: Vec<MethodUid>,
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Class {}

impl PartialOrd for Class {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Class {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uid.cmp(&other.uid)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Class {
    /// Builds an enriched class definition, registering its methods.
    pub(crate) fn new(
        class_uid: ClassUid,
        class_def: &ClassDef,
        system: bool,
        counters: &mut RepoCounters,
        methods: &mut Vec<Method>,
    ) -> Self {
        let mut class_methods = Vec::new();
        for method_def in &class_def.methods {
            let method_uid = counters.new_method_uid();
            methods.push(Method::new(method_uid, class_uid, method_def));
            class_methods.push(method_uid);
        }

        Self {
            uid: class_uid,
            name: class_def.name.clone(),
            flags: Some(class_def.flags),
            system,
            superclass: class_def.superclass.clone(),
            methods: class_methods,
        }
    }

    /// Builds a class that is referenced but whose definition is unknown.
    pub(crate) fn new_no_def(class_uid: ClassUid, name: &str) -> Self {
        Self {
            uid: class_uid,
            name: name.to_string(),
            flags: None,
            system: false,
            superclass: None,
            methods: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn uid(&self) -> ClassUid {
        self.uid
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.flags.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn is_system(&self) -> bool {
        self.system
    }

    #[inline]
    #[must_use]
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Returns a iterator over all methods contained in the class.
    pub fn iter_methods<'r>(&'r self, repo: &'r Repo) -> impl Iterator<Item = &'r Method> {
        self.methods.iter().map(|muid| &repo[*muid])
    }

    /// Finds the method declared by this class with the same name and
    /// prototype as `descriptor`, whatever holder the descriptor names.
    pub fn get_method<'r>(
        &'r self,
        descriptor: &dw_ir::MethodDescr,
        repo: &'r Repo,
    ) -> Option<&'r Method> {
        self.iter_methods(repo)
            .find(|method| method.descriptor().same_signature(descriptor))
    }

    fn has_flag(&self, flag: ClassFlags) -> bool {
        self.flags.map_or(false, |flags| flags.contains(flag))
    }

    #[inline]
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.has_flag(ClassFlags::ACC_PUBLIC)
    }

    #[inline]
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.has_flag(ClassFlags::ACC_INTERFACE)
    }

    #[inline]
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.has_flag(ClassFlags::ACC_ABSTRACT)
    }

    /// Defined classes that can be instantiated.
    #[must_use]
    pub fn is_concrete(&self) -> bool {
        self.is_defined() && !self.is_interface() && !self.is_abstract()
    }
}
