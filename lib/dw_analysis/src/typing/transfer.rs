//! Output type of each instruction, given the current types of its operands.

use crate::repo::Repo;
use crate::typing::lattice::Lattice;
use dw_ir::instrs::{Constant, InstrKind};
use dw_ir::lattice::{Nullability, PrimitiveKind, TypeElement};
use dw_ir::{Code, InstrId, ValueId};

fn operand_type(code: &Code, instr: InstrId, index: usize) -> TypeElement {
    code.instr(instr)
        .ins()
        .get(index)
        .map_or(TypeElement::Bottom, |value| code.type_of(*value).clone())
}

fn constant_type(constant: &Constant) -> TypeElement {
    match constant {
        Constant::Int(_) => TypeElement::Primitive(PrimitiveKind::Int),
        Constant::Long(_) => TypeElement::Primitive(PrimitiveKind::Long),
        Constant::Float(_) => TypeElement::Primitive(PrimitiveKind::Float),
        Constant::Double(_) => TypeElement::Primitive(PrimitiveKind::Double),
        Constant::String(_) => {
            TypeElement::class("java/lang/String", Nullability::DefinitelyNotNull)
        }
        Constant::Null => TypeElement::Null,
        Constant::Class(_) => TypeElement::class("java/lang/Class", Nullability::DefinitelyNotNull),
    }
}

/// Computes the type of the out value of `instr`.
///
/// Instructions without result evaluate to `Bottom`, and so do arguments,
/// whose types are not computed from operands.
pub fn evaluate(code: &Code, instr: InstrId, repo: &Repo) -> TypeElement {
    match code.instr(instr).kind() {
        InstrKind::Const(constant) => constant_type(constant),
        InstrKind::NewInstance(name) => TypeElement::class(name, Nullability::DefinitelyNotNull),
        InstrKind::NewArray(t) => TypeElement::from_type(t, Nullability::DefinitelyNotNull),
        InstrKind::CheckCast(t) => {
            let input = operand_type(code, instr, 0);
            if input.is_bottom() {
                return TypeElement::Bottom;
            }
            let nullability = input.nullability().unwrap_or(Nullability::MaybeNull);
            let cast = TypeElement::from_type(t, nullability);
            if input.less_or_equal(&cast, repo) {
                input
            } else {
                cast
            }
        }
        InstrKind::InstanceOf(_) | InstrKind::ArrayLength => {
            TypeElement::Primitive(PrimitiveKind::Int)
        }
        InstrKind::ArrayGet => operand_type(code, instr, 0).array_member_type(),
        InstrKind::Move => operand_type(code, instr, 0),
        InstrKind::AssumeNonNull { .. } => operand_type(code, instr, 0).as_non_null(),
        InstrKind::Invoke { method, .. } => {
            TypeElement::from_type(method.return_type(), Nullability::MaybeNull)
        }
        InstrKind::InstanceGet(field) | InstrKind::StaticGet(field) => {
            TypeElement::from_type(field.type_(), Nullability::MaybeNull)
        }
        InstrKind::Argument
        | InstrKind::If
        | InstrKind::Goto
        | InstrKind::Return
        | InstrKind::Throw => TypeElement::Bottom,
    }
}

/// Joins the types of the operands of a phi.
pub fn compute_phi_type(code: &Code, phi: ValueId, repo: &Repo) -> TypeElement {
    code.phi_operands(phi)
        .iter()
        .fold(TypeElement::Bottom, |acc, operand| {
            acc.join(code.type_of(*operand), repo)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::repo_from;
    use dw_ir::text::parse_code;
    use dw_ir::Type;
    use Nullability::*;

    const CODE: &str = r#"
.block B0 -> B1 B2
    v0 = argument
    v1 = new-instance La/B;
    v2 = check-cast v0 La/A;
    v3 = check-cast v1 La/A;
    v4 = assume-non-null v0
    v5 = const 3
    v6 = new-array v5 [La/B;
    v7 = aget v6 v5
    v8 = const-string "s"
    if v5
.block B1 -> B3
    goto
.block B2 -> B3
    v9 = const-null
    goto
.block B3
    v10 = phi v1 v9
    return v10
"#;

    const HIERARCHY: &str = r#"
.class public La/A;
.end class
.class public La/B;
.super La/A;
.end class
"#;

    fn instr_of(code: &Code, value: usize) -> InstrId {
        code.value(ValueId::from_index(value))
            .definition_instr()
            .unwrap()
    }

    #[test]
    fn transfer_functions() {
        let repo = repo_from(HIERARCHY);
        let mut code = parse_code(CODE).unwrap();
        code.set_type(ValueId::from_index(0), TypeElement::class("x/X", MaybeNull));
        for index in 1..10 {
            let instr = instr_of(&code, index);
            let t = evaluate(&code, instr, &repo);
            code.set_type(ValueId::from_index(index), t);
        }

        let type_of = |index: usize| code.type_of(ValueId::from_index(index)).clone();
        assert_eq!(type_of(1), TypeElement::class("a/B", DefinitelyNotNull));
        // unrelated input: the cast type wins, keeping the input nullability
        assert_eq!(type_of(2), TypeElement::class("a/A", MaybeNull));
        // already more precise than the cast type
        assert_eq!(type_of(3), TypeElement::class("a/B", DefinitelyNotNull));
        assert_eq!(type_of(4), TypeElement::class("x/X", DefinitelyNotNull));
        assert_eq!(type_of(5), TypeElement::Primitive(PrimitiveKind::Int));
        assert_eq!(
            type_of(6),
            TypeElement::from_type(&Type::try_from("[La/B;").unwrap(), DefinitelyNotNull)
        );
        assert_eq!(type_of(7), TypeElement::class("a/B", MaybeNull));
        assert_eq!(type_of(8), TypeElement::class("java/lang/String", DefinitelyNotNull));
        assert_eq!(type_of(9), TypeElement::Null);

        assert_eq!(
            compute_phi_type(&code, ValueId::from_index(10), &repo),
            TypeElement::class("a/B", MaybeNull)
        );
    }

    #[test]
    fn cast_of_unknown_input() {
        let repo = repo_from(HIERARCHY);
        let code = parse_code(CODE).unwrap();
        // operands still typed Bottom
        assert!(evaluate(&code, instr_of(&code, 2), &repo).is_bottom());
        assert!(evaluate(&code, instr_of(&code, 7), &repo).is_bottom());
    }
}
