/*
 * vrp-core - Value Range Propagation
 *
 * Feature-First Hexagonal Architecture:
 * - errors.rs    : Crate-wide error type
 * - features/    : Vertical slices (today: vrp, the constraint-graph
 *                  fixpoint solver)
 *
 * Each feature is split into:
 * - domain/         : Data model (Z, Interval, Constraint, Graph), no I/O
 * - ports/          : The SSA surface this feature consumes, modeled as a
 *                     trait plus a minimal concrete IR so the crate is
 *                     self-contained
 * - infrastructure/ : Graph construction, SCC, the fixpoint solver, clamp,
 *                     Graphviz rendering
 * - application/    : Public facade tying the above together
 */

pub mod errors;
pub mod features;

pub use errors::{Result, VrpError};
