use std::fmt;
use std::str::FromStr;

use crate::branch_bound::{BranchAndBound, BranchAndBoundOutcome};
use crate::cutting_plane::{CuttingPlane, CuttingPlaneOutcome};
use crate::dual::DualSimplex;
use crate::error::{SolveError, SolveResult};
use crate::knapsack::{KnapsackBranchAndBound, KnapsackOutcome, KnapsackProblem};
use crate::options::SolverOptions;
use crate::primal::PrimalSimplex;
use crate::problem::LinearProgram;
use crate::revised::{RevisedOutcome, RevisedSimplex};
use crate::sensitivity::{SensitivityAnalyzer, SensitivityReport};
use crate::solution::{SimplexRun, Solution};
use crate::tableau::Tableau;

/// Algorithm used to solve a [`LinearProgram`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Primal,
    Dual,
    Revised,
    BranchAndBound,
    CuttingPlane,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Method::Primal => "primal",
            Method::Dual => "dual",
            Method::Revised => "revised",
            Method::BranchAndBound => "branch-and-bound",
            Method::CuttingPlane => "cutting-plane",
        };
        f.write_str(text)
    }
}

impl FromStr for Method {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primal" => Ok(Method::Primal),
            "dual" => Ok(Method::Dual),
            "revised" => Ok(Method::Revised),
            "branch-and-bound" | "bnb" => Ok(Method::BranchAndBound),
            "cutting-plane" | "gomory" => Ok(Method::CuttingPlane),
            other => Err(SolveError::malformed(format!("unknown method '{other}'"))),
        }
    }
}

/// Result of [`Solver::solve`], one variant per engine family
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "method", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum SolveReport {
    Simplex(SimplexRun),
    Revised(RevisedOutcome),
    BranchAndBound(BranchAndBoundOutcome),
    CuttingPlane(CuttingPlaneOutcome),
}

impl SolveReport {
    /// Optimal (or best found) solution; `None` when a search found no
    /// integer point.
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveReport::Simplex(run) => Some(&run.solution),
            SolveReport::Revised(outcome) => Some(&outcome.solution),
            SolveReport::BranchAndBound(outcome) => outcome.solution.as_ref(),
            SolveReport::CuttingPlane(outcome) => Some(&outcome.solution),
        }
    }

    /// Final tableau of the original program, which sensitivity analysis
    /// can range. Search engines end on extended tableaux and have none.
    pub fn final_tableau(&self) -> Option<&Tableau> {
        match self {
            SolveReport::Simplex(run) => Some(run.final_tableau()),
            _ => None,
        }
    }
}

/// Entry point dispatching to the individual engines with shared options.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    options: SolverOptions,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn solve(&self, program: &LinearProgram, method: Method) -> SolveResult<SolveReport> {
        match method {
            Method::Primal => self.primal(program).map(SolveReport::Simplex),
            Method::Dual => self.dual(program).map(SolveReport::Simplex),
            Method::Revised => self.revised(program).map(SolveReport::Revised),
            Method::BranchAndBound => self.branch_and_bound(program).map(SolveReport::BranchAndBound),
            Method::CuttingPlane => self.cutting_plane(program).map(SolveReport::CuttingPlane),
        }
    }

    pub fn primal(&self, program: &LinearProgram) -> SolveResult<SimplexRun> {
        PrimalSimplex::new(self.options).solve(program)
    }

    pub fn dual(&self, program: &LinearProgram) -> SolveResult<SimplexRun> {
        DualSimplex::new(self.options).solve(program)
    }

    pub fn revised(&self, program: &LinearProgram) -> SolveResult<RevisedOutcome> {
        RevisedSimplex::new(self.options).solve(program)
    }

    pub fn branch_and_bound(&self, program: &LinearProgram) -> SolveResult<BranchAndBoundOutcome> {
        BranchAndBound::new(self.options).solve(program)
    }

    pub fn cutting_plane(&self, program: &LinearProgram) -> SolveResult<CuttingPlaneOutcome> {
        CuttingPlane::new(self.options).solve(program)
    }

    pub fn knapsack(&self, problem: &KnapsackProblem) -> SolveResult<KnapsackOutcome> {
        KnapsackBranchAndBound::new(self.options).solve(problem)
    }

    pub fn sensitivity(&self, program: &LinearProgram, tableau: &Tableau) -> SolveResult<SensitivityReport> {
        SensitivityAnalyzer::new(self.options).analyze(program, tableau)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ConstraintOp;

    #[test]
    fn test_method_round_trips_through_text() {
        for method in [
            Method::Primal,
            Method::Dual,
            Method::Revised,
            Method::BranchAndBound,
            Method::CuttingPlane,
        ] {
            assert_eq!(method.to_string().parse::<Method>(), Ok(method));
        }
        assert!("simplex".parse::<Method>().is_err());
    }

    #[test]
    fn test_dispatch_and_final_tableau() {
        let program = LinearProgram::maximize(vec![1.0, 1.0]).subject_to(vec![1.0, 2.0], ConstraintOp::Le, 4.0);
        let solver = Solver::new();

        let report = solver.solve(&program, Method::Dual).unwrap();
        assert_eq!(report.solution().unwrap().objective_value, 4.0);
        assert!(report.final_tableau().is_some());

        let report = solver.solve(&program, Method::Revised).unwrap();
        assert!(report.final_tableau().is_none());
    }
}
