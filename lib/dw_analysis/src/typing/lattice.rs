//! Join, meet and ordering of type elements with respect to a class hierarchy.

use crate::repo::Repo;
use dw_ir::lattice::{ArrayBase, Nullability, TypeElement};
use dw_ir::types::JAVA_LANG_OBJECT;
use lazy_static::lazy_static;
use std::collections::BTreeSet;

lazy_static! {
    // Every array is an instance of these types.
    static ref ARRAY_UPSET: BTreeSet<String> = [
        JAVA_LANG_OBJECT,
        "java/lang/Cloneable",
        "java/io/Serializable",
    ]
    .into_iter()
    .map(str::to_string)
    .collect();
}

/// Order and bounds of a lattice whose comparisons depend on the classes
/// hierarchy.
pub trait Lattice: PartialEq + Sized {
    /// Least upper bound.
    #[must_use]
    fn join(&self, other: &Self, repo: &Repo) -> Self;

    /// Greatest lower bound.
    #[must_use]
    fn meet(&self, other: &Self, repo: &Repo) -> Self;

    fn less_or_equal(&self, other: &Self, repo: &Repo) -> bool;

    fn strictly_less_than(&self, other: &Self, repo: &Repo) -> bool {
        self != other && self.less_or_equal(other, repo)
    }
}

fn upset(types: &BTreeSet<String>, repo: &Repo) -> BTreeSet<String> {
    types.iter().flat_map(|t| repo.supertypes(t)).collect()
}

/// Removes from `types` every name that is a super type of another one.
fn minimal(types: BTreeSet<String>, repo: &Repo) -> BTreeSet<String> {
    types
        .iter()
        .filter(|t| {
            !types
                .iter()
                .any(|u| u != *t && repo.is_typeable_as(u, t))
        })
        .cloned()
        .collect()
}

fn join_sets(s1: &BTreeSet<String>, s2: &BTreeSet<String>, repo: &Repo) -> BTreeSet<String> {
    let common = upset(s1, repo)
        .intersection(&upset(s2, repo))
        .cloned()
        .collect();
    minimal(common, repo)
}

fn meet_sets(s1: &BTreeSet<String>, s2: &BTreeSet<String>, repo: &Repo) -> BTreeSet<String> {
    minimal(s1.union(s2).cloned().collect(), repo)
}

/// Whether `s1` is a subtype of every name of `s2`.
fn sets_less_or_equal(s1: &BTreeSet<String>, s2: &BTreeSet<String>, repo: &Repo) -> bool {
    let up = upset(s1, repo);
    s2.iter().all(|t| up.contains(t))
}

fn array_and_class_join(
    array_nullability: Nullability,
    types: &BTreeSet<String>,
    nullability: Nullability,
    repo: &Repo,
) -> TypeElement {
    let common = ARRAY_UPSET
        .intersection(&upset(types, repo))
        .cloned()
        .collect();
    TypeElement::Class {
        types: minimal(common, repo),
        nullability: array_nullability.join(nullability),
    }
}

impl Lattice for TypeElement {
    fn join(&self, other: &Self, repo: &Repo) -> Self {
        match (self, other) {
            (Self::Bottom, x) | (x, Self::Bottom) => x.clone(),
            (Self::Top, _) | (_, Self::Top) => Self::Top,
            (Self::Primitive(p), Self::Primitive(q)) if p == q => self.clone(),
            (Self::Primitive(_), _) | (_, Self::Primitive(_)) => Self::Top,
            (Self::Null, Self::Null) => Self::Null,
            (Self::Null, x) | (x, Self::Null) => {
                let nullability = x
                    .nullability()
                    .map_or(Nullability::DefinitelyNull, |n| {
                        n.join(Nullability::DefinitelyNull)
                    });
                x.with_nullability(nullability)
            }
            (
                Self::Class {
                    types: t1,
                    nullability: n1,
                },
                Self::Class {
                    types: t2,
                    nullability: n2,
                },
            ) => Self::Class {
                types: join_sets(t1, t2, repo),
                // kept even when the classes only meet at the root, so two
                // non-null unrelated classes join to a non-null root
                nullability: n1.join(*n2),
            },
            (
                Self::Array {
                    dimensions: d1,
                    base: b1,
                    nullability: n1,
                },
                Self::Array {
                    dimensions: d2,
                    base: b2,
                    nullability: n2,
                },
            ) => {
                let base = match (b1, b2) {
                    _ if d1 != d2 => None,
                    (ArrayBase::Primitive(p1), ArrayBase::Primitive(p2)) if p1 == p2 => {
                        Some(b1.clone())
                    }
                    (ArrayBase::Reference(s1), ArrayBase::Reference(s2)) => {
                        Some(ArrayBase::Reference(join_sets(s1, s2, repo)))
                    }
                    _ => None,
                };
                match base {
                    Some(base) => Self::Array {
                        dimensions: *d1,
                        base,
                        nullability: n1.join(*n2),
                    },
                    None => Self::Class {
                        types: minimal((*ARRAY_UPSET).clone(), repo),
                        nullability: n1.join(*n2),
                    },
                }
            }
            (
                Self::Array {
                    nullability: an, ..
                },
                Self::Class { types, nullability },
            )
            | (
                Self::Class { types, nullability },
                Self::Array {
                    nullability: an, ..
                },
            ) => array_and_class_join(*an, types, *nullability, repo),
        }
    }

    fn meet(&self, other: &Self, repo: &Repo) -> Self {
        match (self, other) {
            (Self::Top, x) | (x, Self::Top) => x.clone(),
            (Self::Bottom, _) | (_, Self::Bottom) => Self::Bottom,
            (Self::Primitive(p), Self::Primitive(q)) if p == q => self.clone(),
            (Self::Primitive(_), _) | (_, Self::Primitive(_)) => Self::Bottom,
            (Self::Null, Self::Null) => Self::Null,
            (Self::Null, x) | (x, Self::Null) => {
                if x.nullability() == Some(Nullability::DefinitelyNotNull) {
                    Self::Bottom
                } else {
                    Self::Null
                }
            }
            (
                Self::Class {
                    types: t1,
                    nullability: n1,
                },
                Self::Class {
                    types: t2,
                    nullability: n2,
                },
            ) => n1.meet(*n2).map_or(Self::Bottom, |nullability| Self::Class {
                types: meet_sets(t1, t2, repo),
                nullability,
            }),
            (
                Self::Array {
                    dimensions: d1,
                    base: b1,
                    nullability: n1,
                },
                Self::Array {
                    dimensions: d2,
                    base: b2,
                    nullability: n2,
                },
            ) => {
                let base = match (b1, b2) {
                    _ if d1 != d2 => None,
                    (ArrayBase::Primitive(p1), ArrayBase::Primitive(p2)) if p1 == p2 => {
                        Some(b1.clone())
                    }
                    (ArrayBase::Reference(s1), ArrayBase::Reference(s2)) => {
                        Some(ArrayBase::Reference(meet_sets(s1, s2, repo)))
                    }
                    _ => None,
                };
                match (base, n1.meet(*n2)) {
                    (Some(base), Some(nullability)) => Self::Array {
                        dimensions: *d1,
                        base,
                        nullability,
                    },
                    _ => Self::Bottom,
                }
            }
            (
                array @ Self::Array {
                    nullability: an, ..
                },
                Self::Class { types, nullability },
            )
            | (
                Self::Class { types, nullability },
                array @ Self::Array {
                    nullability: an, ..
                },
            ) => match an.meet(*nullability) {
                Some(n) if types.is_subset(&ARRAY_UPSET) => array.with_nullability(n),
                _ => Self::Bottom,
            },
        }
    }

    fn less_or_equal(&self, other: &Self, repo: &Repo) -> bool {
        match (self, other) {
            (Self::Bottom, _) | (_, Self::Top) => true,
            (Self::Top, _) | (_, Self::Bottom) => false,
            (Self::Primitive(p), Self::Primitive(q)) => p == q,
            (Self::Primitive(_), _) | (_, Self::Primitive(_)) => false,
            (Self::Null, Self::Null) => true,
            (Self::Null, x) => x.nullability() != Some(Nullability::DefinitelyNotNull),
            (_, Self::Null) => false,
            (
                Self::Class {
                    types: t1,
                    nullability: n1,
                },
                Self::Class {
                    types: t2,
                    nullability: n2,
                },
            ) => n1.less_or_equal(*n2) && sets_less_or_equal(t1, t2, repo),
            (
                Self::Array {
                    dimensions: d1,
                    base: b1,
                    nullability: n1,
                },
                Self::Array {
                    dimensions: d2,
                    base: b2,
                    nullability: n2,
                },
            ) => {
                d1 == d2
                    && n1.less_or_equal(*n2)
                    && match (b1, b2) {
                        (ArrayBase::Primitive(p1), ArrayBase::Primitive(p2)) => p1 == p2,
                        (ArrayBase::Reference(s1), ArrayBase::Reference(s2)) => {
                            sets_less_or_equal(s1, s2, repo)
                        }
                        _ => false,
                    }
            }
            (Self::Array { nullability: n1, .. }, Self::Class { types, nullability: n2 }) => {
                n1.less_or_equal(*n2) && types.is_subset(&ARRAY_UPSET)
            }
            (Self::Class { .. }, Self::Array { .. }) => false,
        }
    }
}

/// The class a class element stands for: its only member that is not an
/// interface, or the root class when there is none or several.
#[must_use]
pub fn class_type(element: &TypeElement, repo: &Repo) -> Option<String> {
    let types = element.class_names()?;
    let mut classes = types
        .iter()
        .filter(|name| repo.is_interface(name) != Some(true));
    match (classes.next(), classes.next()) {
        (Some(name), None) => Some(name.clone()),
        _ => Some(JAVA_LANG_OBJECT.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::repo_from;
    use dw_ir::lattice::PrimitiveKind;
    use dw_ir::Type;
    use proptest::prelude::*;
    use Nullability::*;

    const HIERARCHY: &str = r#"
.class public interface abstract La/I;
.end class
.class public interface abstract La/J;
.end class
.class public La/A;
.super Ljava/lang/Object;
.implements La/I;
.implements La/J;
.end class
.class public La/B;
.super La/A;
.end class
.class public La/C;
.super La/A;
.end class
.class public La/D;
.super Ljava/lang/Object;
.implements La/I;
.end class
"#;

    lazy_static! {
        static ref REPO: Repo = repo_from(HIERARCHY);
    }

    const NAMES: [&str; 7] = ["a/I", "a/J", "a/A", "a/B", "a/C", "a/D", JAVA_LANG_OBJECT];

    fn class(names: &[&str], nullability: Nullability) -> TypeElement {
        TypeElement::Class {
            types: names.iter().map(|n| n.to_string()).collect(),
            nullability,
        }
    }

    #[test]
    fn class_joins() {
        let repo = &*REPO;
        let b = class(&["a/B"], DefinitelyNotNull);
        let c = class(&["a/C"], DefinitelyNotNull);
        let d = class(&["a/D"], MaybeNull);

        assert_eq!(b.join(&c, repo), class(&["a/A"], DefinitelyNotNull));
        assert_eq!(b.join(&d, repo), class(&["a/I"], MaybeNull));
        assert_eq!(b.join(&TypeElement::Null, repo), class(&["a/B"], MaybeNull));
        assert_eq!(
            class(&["x/Unknown"], DefinitelyNotNull).join(&c, repo),
            class(&[JAVA_LANG_OBJECT], DefinitelyNotNull)
        );
        assert_eq!(
            class(&["a/I"], MaybeNull).meet(&class(&["a/J"], MaybeNull), repo),
            class(&["a/I", "a/J"], MaybeNull)
        );
        assert_eq!(
            class(&["a/A"], DefinitelyNotNull).meet(&class(&["a/I"], MaybeNull), repo),
            class(&["a/A"], DefinitelyNotNull)
        );
        assert!(class(&["a/A"], DefinitelyNull)
            .meet(&class(&["a/A"], DefinitelyNotNull), repo)
            .is_bottom());
    }

    #[test]
    fn ordering() {
        let repo = &*REPO;
        let b = class(&["a/B"], DefinitelyNotNull);
        assert!(b.less_or_equal(&class(&["a/I", "a/J"], MaybeNull), repo));
        assert!(b.strictly_less_than(&class(&["a/A"], DefinitelyNotNull), repo));
        assert!(!b.less_or_equal(&class(&["a/D"], MaybeNull), repo));
        assert!(!class(&["a/B"], MaybeNull).less_or_equal(&class(&["a/A"], DefinitelyNotNull), repo));
        assert!(TypeElement::Null.less_or_equal(&class(&["a/B"], MaybeNull), repo));
        assert!(!TypeElement::Null.less_or_equal(&b, repo));
        assert!(!b.strictly_less_than(&b, repo));
    }

    #[test]
    fn arrays_and_primitives() {
        let repo = &*REPO;
        let ints = TypeElement::from_type(&Type::try_from("[I").unwrap(), DefinitelyNotNull);
        let longs = TypeElement::from_type(&Type::try_from("[J").unwrap(), DefinitelyNotNull);
        let bs = TypeElement::from_type(&Type::try_from("[La/B;").unwrap(), MaybeNull);
        let cs = TypeElement::from_type(&Type::try_from("[La/C;").unwrap(), MaybeNull);

        assert_eq!(
            ints.join(&longs, repo),
            class(&["java/io/Serializable", "java/lang/Cloneable"], DefinitelyNotNull)
        );
        assert_eq!(
            bs.join(&cs, repo),
            TypeElement::from_type(&Type::try_from("[La/A;").unwrap(), MaybeNull)
        );
        assert_eq!(
            ints.join(&class(&["a/B"], DefinitelyNotNull), repo),
            class(&[JAVA_LANG_OBJECT], DefinitelyNotNull)
        );
        assert!(ints.less_or_equal(&class(&["java/lang/Cloneable"], MaybeNull), repo));
        assert!(!class(&[JAVA_LANG_OBJECT], MaybeNull).less_or_equal(&ints, repo));
        assert!(ints.meet(&class(&["a/A"], MaybeNull), repo).is_bottom());

        let int = TypeElement::Primitive(PrimitiveKind::Int);
        let double = TypeElement::Primitive(PrimitiveKind::Double);
        assert!(int.join(&double, repo).is_top());
        assert!(int.join(&TypeElement::Null, repo).is_top());
        assert!(int.meet(&ints, repo).is_bottom());
        assert_eq!(int.join(&TypeElement::Bottom, repo), int);
    }

    #[test]
    fn class_types() {
        let repo = &*REPO;
        assert_eq!(
            class_type(&class(&["a/A", "a/I"], MaybeNull), repo).as_deref(),
            Some("a/A")
        );
        assert_eq!(
            class_type(&class(&["a/I", "a/J"], MaybeNull), repo).as_deref(),
            Some(JAVA_LANG_OBJECT)
        );
        assert_eq!(class_type(&TypeElement::Null, repo), None);
    }

    fn nullability() -> impl Strategy<Value = Nullability> {
        prop_oneof![Just(DefinitelyNull), Just(MaybeNull), Just(DefinitelyNotNull)]
    }

    fn antichain() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set(prop::sample::select(NAMES.to_vec()), 1..4).prop_map(|names| {
            minimal(names.into_iter().map(str::to_string).collect(), &REPO)
        })
    }

    fn element() -> impl Strategy<Value = TypeElement> {
        prop_oneof![
            Just(TypeElement::Bottom),
            Just(TypeElement::Top),
            Just(TypeElement::Null),
            Just(TypeElement::Primitive(PrimitiveKind::Int)),
            Just(TypeElement::Primitive(PrimitiveKind::Long)),
            (antichain(), nullability())
                .prop_map(|(types, nullability)| TypeElement::Class { types, nullability }),
            (1..3usize, antichain(), nullability()).prop_map(|(dimensions, types, nullability)| {
                TypeElement::Array {
                    dimensions,
                    base: ArrayBase::Reference(types),
                    nullability,
                }
            }),
            (1..3usize, nullability()).prop_map(|(dimensions, nullability)| {
                TypeElement::Array {
                    dimensions,
                    base: ArrayBase::Primitive(Type::Int),
                    nullability,
                }
            }),
        ]
    }

    proptest! {
        #[test]
        fn join_is_a_commutative_upper_bound(a in element(), b in element()) {
            let repo = &*REPO;
            let j = a.join(&b, repo);
            prop_assert_eq!(&j, &b.join(&a, repo));
            prop_assert!(a.less_or_equal(&j, repo));
            prop_assert!(b.less_or_equal(&j, repo));
            prop_assert_eq!(a.join(&a, repo), a.clone());
        }

        #[test]
        fn join_is_associative(a in element(), b in element(), c in element()) {
            let repo = &*REPO;
            prop_assert_eq!(
                a.join(&b.join(&c, repo), repo),
                a.join(&b, repo).join(&c, repo)
            );
            prop_assert_eq!(a.join(&TypeElement::Bottom, repo), a.clone());
            prop_assert_eq!(a.meet(&TypeElement::Top, repo), a);
        }

        #[test]
        fn meet_is_a_commutative_lower_bound(a in element(), b in element()) {
            let repo = &*REPO;
            let m = a.meet(&b, repo);
            prop_assert_eq!(&m, &b.meet(&a, repo));
            prop_assert!(m.less_or_equal(&a, repo));
            prop_assert!(m.less_or_equal(&b, repo));
        }

        #[test]
        fn order_agrees_with_join(a in element(), b in element()) {
            let repo = &*REPO;
            prop_assert!(a.less_or_equal(&a, repo));
            prop_assert_eq!(a.less_or_equal(&b, repo), a.join(&b, repo) == b);
        }
    }
}
