//! The SSA surface this feature consumes (spec §1 "out of scope / external
//! collaborators"). SSA construction, the surrounding type system, and
//! arbitrary-precision arithmetic are owned elsewhere; this module gives
//! the core a minimal, concrete IR to build a `Graph` from, and is the
//! seam a real compiler frontend would adapt into.

use crate::errors::{Result, VrpError};
use crate::features::vrp::domain::constraint::ValueId;
use crate::features::vrp::domain::zahl::Z;

/// A binary comparison token, as it appears in a conditional branch
/// terminator. `invert` implements the mapping σ-node handling needs when
/// flipping to the false-branch reading or re-orienting operands (spec
/// §4.1): `< ↔ ≥`, `> ↔ ≤`, `= ↔ ≠`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Token {
    pub fn invert(self) -> Token {
        match self {
            Token::Lt => Token::Ge,
            Token::Ge => Token::Lt,
            Token::Gt => Token::Le,
            Token::Le => Token::Gt,
            Token::Eq => Token::Ne,
            Token::Ne => Token::Eq,
        }
    }

    /// Parses a textual comparison operator. Frontends that hand the core
    /// a string-typed token (rather than building `Token` directly) go
    /// through here; an unrecognised token is a §7 category-3 invariant
    /// violation, not a silently-skipped construct.
    pub fn parse(s: &str) -> Result<Token> {
        match s {
            "<" => Ok(Token::Lt),
            "<=" => Ok(Token::Le),
            ">" => Ok(Token::Gt),
            ">=" => Ok(Token::Ge),
            "==" => Ok(Token::Eq),
            "!=" => Ok(Token::Ne),
            other => Err(VrpError::UnknownToken(other.to_string())),
        }
    }
}

/// The kind of a `BinOp`. Only `Add`/`Sub`/`Mul` get a constraint (spec
/// §4.1); division, remainder, and shifts are recognised but deferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
}

impl BinOpKind {
    pub fn is_deferred(self) -> bool {
        matches!(
            self,
            BinOpKind::Div | BinOpKind::Rem | BinOpKind::Shl | BinOpKind::Shr
        )
    }
}

/// What the core needs to know about an SSA value's underlying type
/// (spec §1): integer vs non-integer, signed/unsigned, bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ty {
    Int { signed: bool, bits: u32 },
    /// A basic type that strings/slicing operate over (spec §4.1: "the
    /// sliced value has a basic underlying type").
    StringLike,
    /// Float, pointer, aggregate, ... (spec §1 Non-goals).
    Other,
}

/// Which branch of a conditional a σ-node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    True,
    False,
}

/// The terminating conditional of a σ-node's predecessor block: a binary
/// comparison `lhs op rhs`.
#[derive(Debug, Clone, Copy)]
pub struct Comparison {
    pub op: Token,
    pub lhs: ValueId,
    pub rhs: ValueId,
}

/// One modeled SSA instruction. A real frontend's richer instruction set
/// maps onto this before reaching `infrastructure::build`.
#[derive(Debug, Clone)]
pub enum Inst {
    /// An integer literal constant.
    Const { dest: ValueId, bits: u32, signed: bool, value: Z },
    Convert { dest: ValueId, dest_ty: Ty, operand: ValueId },
    BinOp { dest: ValueId, dest_ty: Ty, op: BinOpKind, lhs: ValueId, rhs: ValueId },
    Phi { dest: ValueId, dest_ty: Ty, operands: Vec<ValueId> },
    /// `source[..]`, the string-length case (spec §4.1).
    Slice { dest: ValueId, source: ValueId, source_ty: Ty },
    /// A σ-node introduced on the successor of a conditional branch,
    /// refining `input` for `branch` using the predecessor's `comparison`.
    Sigma {
        dest: ValueId,
        dest_ty: Ty,
        input: ValueId,
        branch: Branch,
        comparison: Comparison,
    },
    /// A value with no modeled producer (e.g. a function parameter or an
    /// unmodeled load): registers its type so the solver still promotes it
    /// to the type-wide default (spec §4.5 step 4) instead of leaving it
    /// absent from the universe entirely.
    Opaque { dest: ValueId, ty: Ty },
}

impl Inst {
    pub fn dest(&self) -> ValueId {
        match self {
            Inst::Const { dest, .. }
            | Inst::Convert { dest, .. }
            | Inst::BinOp { dest, .. }
            | Inst::Phi { dest, .. }
            | Inst::Slice { dest, .. }
            | Inst::Sigma { dest, .. }
            | Inst::Opaque { dest, .. } => *dest,
        }
    }
}

/// A single function's SSA instruction stream, in any order (constraint
/// generation does not rely on instruction ordering, only on the SSA
/// def/use relationships encoded by `ValueId`).
#[derive(Debug, Clone, Default)]
pub struct Function {
    pub instructions: Vec<Inst>,
}

impl Function {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, inst: Inst) -> &mut Self {
        self.instructions.push(inst);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_is_an_involution() {
        for t in [Token::Lt, Token::Le, Token::Gt, Token::Ge, Token::Eq, Token::Ne] {
            assert_eq!(t.invert().invert(), t);
        }
    }

    #[test]
    fn invert_maps_the_documented_pairs() {
        assert_eq!(Token::Lt.invert(), Token::Ge);
        assert_eq!(Token::Gt.invert(), Token::Le);
        assert_eq!(Token::Eq.invert(), Token::Ne);
    }

    #[test]
    fn parse_rejects_unknown_tokens() {
        assert!(Token::parse("<=").is_ok());
        assert!(matches!(Token::parse("<=>"), Err(VrpError::UnknownToken(_))));
    }
}
