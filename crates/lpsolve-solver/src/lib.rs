//! Linear and integer programming engines that keep every intermediate
//! tableau: primal, dual and revised simplex, branch and bound for general
//! integer programs and 0/1 knapsacks, Gomory cuts, and sensitivity analysis.

mod branch_bound;
mod canonical;
mod cutting_plane;
mod dual;
mod error;
pub mod linalg;
mod knapsack;
mod options;
mod primal;
mod problem;
mod revised;
mod sensitivity;
mod solution;
mod solver;
mod tableau;

pub use branch_bound::{BranchAndBound, BranchAndBoundOutcome, BranchNode, NodeStatus, SearchStatus};
pub use canonical::{CanonicalForm, RowOrigin};
pub use cutting_plane::{CuttingPlane, CuttingPlaneOutcome, GomoryCut};
pub use dual::DualSimplex;
pub use error::{SolveError, SolveResult};
pub use knapsack::{KnapsackBranchAndBound, KnapsackItem, KnapsackNode, KnapsackOutcome, KnapsackProblem};
pub use options::{NodeOrder, SolverOptions};
pub use primal::PrimalSimplex;
pub use problem::{Constraint, ConstraintOp, LinearProgram, Sense, SignRestriction};
pub use revised::{RevisedIteration, RevisedOutcome, RevisedSimplex};
pub use sensitivity::{ReducedCost, SensitivityAnalyzer, SensitivityRange, SensitivityReport, ShadowPrice};
pub use solution::{ConstraintViolation, IterationLog, SimplexRun, Solution};
pub use solver::{Method, SolveReport, Solver};
pub use tableau::{Column, ColumnKind, Convention, RHS, Tableau};
