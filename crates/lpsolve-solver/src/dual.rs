use log::{debug, info, warn};

use crate::canonical::CanonicalForm;
use crate::error::{SolveError, SolveResult};
use crate::options::SolverOptions;
use crate::primal::PrimalSimplex;
use crate::problem::LinearProgram;
use crate::solution::{IterationLog, SimplexRun};
use crate::tableau::{Convention, Tableau};

/// Dual simplex on the dual canonical form, finished by the primal simplex
/// when the dual phase leaves negative objective-row entries behind.
#[derive(Debug, Clone, Default)]
pub struct DualSimplex {
    options: SolverOptions,
}

impl DualSimplex {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn solve(&self, program: &LinearProgram) -> SolveResult<SimplexRun> {
        let tableau = CanonicalForm::build(program, Convention::Dual)?;
        let log = self.solve_from_tableau(tableau)?;
        let run = SimplexRun::new(program, log, self.options.tolerance)?;
        info!(
            "dual simplex: optimal z = {} after {} tableaux",
            run.solution.objective_value,
            run.iterations.len()
        );
        Ok(run)
    }

    /// Dual pivots from a supplied tableau until every RHS is non-negative,
    /// then the primal hand-off if needed. The log starts with `tableau`.
    pub fn solve_from_tableau(&self, tableau: Tableau) -> SolveResult<IterationLog<Tableau>> {
        let mut log = IterationLog::new();
        log.push(tableau.clone());
        let tableau = self.iterate(tableau, &mut log)?;

        let tol = self.options.tolerance;
        let needs_primal = (0..tableau.num_columns())
            .any(|j| tableau.is_eligible(j) && tableau.value(0, j) < -tol);
        if needs_primal {
            debug!("dual simplex: objective row not optimal, handing off to primal simplex");
            let resumed = PrimalSimplex::new(self.options).solve_from_tableau(tableau)?;
            log.append_skipping_first(resumed);
        }
        Ok(log)
    }

    fn iterate(&self, mut tableau: Tableau, log: &mut IterationLog<Tableau>) -> SolveResult<Tableau> {
        let mut pivots = 0;
        loop {
            let Some(row) = self.leaving_row(&tableau) else {
                debug!("dual simplex: primal feasible after {pivots} pivots");
                return Ok(tableau);
            };
            if pivots == self.options.max_iterations {
                warn!("dual simplex: pivot budget of {pivots} exhausted");
                return Err(SolveError::CyclingLimitExceeded { iterations: pivots });
            }
            let Some(col) = self.entering_column(&tableau, row) else {
                debug!("dual simplex: row {row} has no negative entry, infeasible");
                return Err(SolveError::Infeasible);
            };

            debug!(
                "dual pivot {}: row {row} (RHS {}) leaves, {} enters",
                pivots + 1,
                tableau.rhs(row),
                tableau.column(col).name
            );
            tableau.pivot(row, col);
            log.push(tableau.clone());
            pivots += 1;
        }
    }

    /// Row with the most negative RHS, first encountered on ties.
    fn leaving_row(&self, tableau: &Tableau) -> Option<usize> {
        let mut best: Option<usize> = None;
        let mut most_negative = -self.options.tolerance;
        for row in 1..tableau.num_rows() {
            if tableau.rhs(row) < most_negative {
                most_negative = tableau.rhs(row);
                best = Some(row);
            }
        }
        best
    }

    /// Among eligible columns with a negative entry in `row`, the one
    /// minimizing `row0[j] / |a_rj|`.
    fn entering_column(&self, tableau: &Tableau, row: usize) -> Option<usize> {
        let tol = self.options.tolerance;
        let mut best: Option<(usize, f64)> = None;
        for col in 0..tableau.num_columns() {
            let a = tableau.value(row, col);
            if !tableau.is_eligible(col) || a >= -tol {
                continue;
            }
            let ratio = tableau.value(0, col) / a.abs();
            if best.is_none_or(|(_, min)| ratio < min) {
                best = Some((col, ratio));
            }
        }
        best.map(|(col, _)| col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::ConstraintOp;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_minimization_is_dual_feasible_at_start() {
        let program = LinearProgram::minimize(vec![2.0, 3.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 4.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let run = DualSimplex::default().solve(&program).unwrap();
        assert_close(run.solution.objective_value, 9.0);
        assert_close(run.solution.values[0], 3.0);
        assert_close(run.solution.values[1], 1.0);
    }

    #[test]
    fn test_hands_off_to_primal() {
        // all RHS non-negative, so the dual phase does nothing
        let program = LinearProgram::maximize(vec![3.0, 5.0])
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![0.0, 2.0], ConstraintOp::Le, 12.0)
            .subject_to(vec![3.0, 2.0], ConstraintOp::Le, 18.0);

        let run = DualSimplex::default().solve(&program).unwrap();
        assert_close(run.solution.objective_value, 36.0);
        assert_eq!(run.iterations.len(), 3);
    }

    #[test]
    fn test_no_entering_column_is_infeasible() {
        let program = LinearProgram::maximize(vec![1.0, 1.0]).subject_to(vec![1.0, 1.0], ConstraintOp::Le, -2.0);
        assert_eq!(DualSimplex::default().solve(&program), Err(SolveError::Infeasible));
    }

    #[test]
    fn test_equality_split_rows() {
        let program = LinearProgram::minimize(vec![1.0, 2.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Eq, 3.0)
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 2.0);

        let run = DualSimplex::default().solve(&program).unwrap();
        assert_close(run.solution.objective_value, 4.0);
        assert_close(run.solution.values[0], 2.0);
        assert_close(run.solution.values[1], 1.0);
    }
}
