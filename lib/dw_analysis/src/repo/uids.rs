use std::fmt;

/// Unique id to identify a class in the repo
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct ClassUid(usize);

/// Unique id to identify a method in the repo
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct MethodUid(usize);

impl MethodUid {
    pub(crate) const fn idx(self) -> usize {
        self.0
    }
}

impl fmt::Display for MethodUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct RepoCounters {
    nb_classes: usize,
    nb_methods: usize,
}

impl RepoCounters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn new_class_uid(&mut self) -> ClassUid {
        let uid = ClassUid(self.nb_classes);
        self.nb_classes += 1;
        uid
    }

    pub(crate) fn new_method_uid(&mut self) -> MethodUid {
        let uid = MethodUid(self.nb_methods);
        self.nb_methods += 1;
        uid
    }

    pub(crate) const fn nb_classes(&self) -> usize {
        self.nb_classes
    }

    pub(crate) const fn nb_methods(&self) -> usize {
        self.nb_methods
    }
}
