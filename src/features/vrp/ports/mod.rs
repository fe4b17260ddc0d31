//! Ports: the SSA surface this feature consumes, and nothing else (spec §1
//! "out of scope / external collaborators": SSA construction, the
//! surrounding type system, diagnostic rendering all live on the caller's
//! side of this seam).

pub mod ssa;

pub use ssa::{BinOpKind, Branch, Comparison, Function, Inst, Token, Ty};
