//! # Value Range Propagation
//!
//! Computes a conservative symbolic interval `[lo, hi]` for every SSA value
//! of integer type in a function: a sound over-approximation of every
//! runtime value the variable may take. Results feed downstream analyses
//! such as bounds-check elimination and dead-branch detection.
//!
//! ## Algorithm
//! - Build a bipartite constraint graph from SSA (values ↔ constraints),
//!   including σ-node refinements on branch successors.
//! - Partition the graph into strongly connected components (Tarjan),
//!   numbered in reverse topological order.
//! - Solve each SCC with Cousot–Cousot widening (guided by a jump-set of
//!   the function's literal constants) followed by narrowing.
//! - Clamp the final ranges to each value's declared integer type.
//!
//! ## References
//! - Cousot, P. & Cousot, R. "Abstract Interpretation" (POPL 1977)
//! - Cousot, P. & Cousot, R. "Comparing the Galois Connection and Widening/Narrowing
//!   Approaches to Abstract Interpretation" (PLILP 1992)
//! - Gawlitza, T. & Seidl, H. "Precise Fixpoint Computation Through Strategy
//!   Iteration" (ESOP 2007), jump-set guided widening
//!
//! ## Usage
//! ```text
//! use vrp_core::features::vrp::application::analyzer::RangeAnalyzer;
//!
//! let mut analyzer = RangeAnalyzer::new(Default::default());
//! let graph = analyzer.analyze(&function)?;
//! let range = graph.range(some_value);
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::analyzer::{RangeAnalysisConfig, RangeAnalyzer};
pub use domain::constraint::{Constraint, ConstraintKind};
pub use domain::graph::{Graph, GraphStats};
pub use domain::range::{Interval, Range, StringRange};
pub use domain::zahl::Z;
