use log::{debug, info, warn};

use crate::dual::DualSimplex;
use crate::error::{SolveError, SolveResult};
use crate::options::SolverOptions;
use crate::primal::PrimalSimplex;
use crate::problem::LinearProgram;
use crate::solution::{IterationLog, Solution};
use crate::tableau::{Column, ColumnKind, Tableau};

/// A Gomory fractional cut appended as a new tableau row.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GomoryCut {
    /// Name of the cut's slack column, `c{k}`
    pub name: String,
    /// Tableau row the cut was derived from
    pub source_row: usize,
    /// Cut row over every column, the new slack included
    pub coefficients: Vec<f64>,
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CuttingPlaneOutcome {
    pub iterations: IterationLog<Tableau>,
    pub cuts: Vec<GomoryCut>,
    pub tableau: Tableau,
    pub solution: Solution,
}

/// Gomory cutting plane loop: primal simplex for the relaxation, one cut
/// per round, dual simplex to restore feasibility.
#[derive(Debug, Clone, Default)]
pub struct CuttingPlane {
    options: SolverOptions,
}

impl CuttingPlane {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn solve(&self, program: &LinearProgram) -> SolveResult<CuttingPlaneOutcome> {
        let relaxation = PrimalSimplex::new(self.options).solve(program)?;
        let dual = DualSimplex::new(self.options);
        let mut iterations = relaxation.iterations;
        let mut tableau = relaxation.tableau;
        let mut cuts: Vec<GomoryCut> = Vec::new();

        while !tableau.has_integral_rhs(self.options.integrality_tolerance) {
            if cuts.len() == self.options.max_cuts {
                warn!("cutting plane: cut budget of {} exhausted", self.options.max_cuts);
                return Err(SolveError::CyclingLimitExceeded { iterations: cuts.len() });
            }
            let row = self
                .source_row(&tableau)
                .ok_or_else(|| SolveError::malformed("no fractional row to cut from"))?;
            let cut = self.add_cut(&mut tableau, row, cuts.len() + 1)?;
            debug!("cutting plane: {} from row {row}, rhs {}", cut.name, cut.rhs);
            cuts.push(cut);
            iterations.push(tableau.clone());

            let resumed = dual.solve_from_tableau(tableau)?;
            tableau = resumed
                .last()
                .cloned()
                .ok_or_else(|| SolveError::malformed("empty iteration log"))?;
            iterations.append_skipping_first(resumed);
        }

        let solution = Solution {
            values: tableau.decision_values(program.num_variables(), self.options.tolerance),
            objective_value: program.from_max_space(tableau.objective_value()),
        };
        info!(
            "cutting plane: z = {} after {} cuts",
            solution.objective_value,
            cuts.len()
        );
        Ok(CuttingPlaneOutcome {
            iterations,
            cuts,
            tableau,
            solution,
        })
    }

    /// Constraint row whose RHS fractional part is closest to 0.5; ties go
    /// to the row with the lower basic column.
    fn source_row(&self, tableau: &Tableau) -> Option<usize> {
        let tol = self.options.tolerance;
        let mut best: Option<(usize, f64, usize)> = None;
        for row in 1..tableau.num_rows() {
            let frac = self.options.fractional_part(tableau.rhs(row));
            if frac == 0.0 {
                continue;
            }
            let distance = (frac - 0.5).abs();
            let basic = tableau.basic_column(row, tol).unwrap_or(usize::MAX);
            let better = match best {
                None => true,
                Some((_, d, b)) => distance < d - tol || ((distance - d).abs() <= tol && basic < b),
            };
            if better {
                best = Some((row, distance, basic));
            }
        }
        best.map(|(row, _, _)| row)
    }

    fn add_cut(&self, tableau: &mut Tableau, row: usize, k: usize) -> SolveResult<GomoryCut> {
        let name = format!("c{k}");
        let slack = tableau.push_column(Column::new(name.clone(), ColumnKind::Cut))?;

        let coefficients: Vec<f64> = (0..tableau.num_columns())
            .map(|j| {
                if j == slack {
                    1.0
                } else if tableau.column(j).kind == ColumnKind::Artificial {
                    0.0
                } else {
                    -self.options.fractional_part(tableau.value(row, j))
                }
            })
            .collect();
        let rhs = -self.options.fractional_part(tableau.rhs(row));
        tableau.push_row(coefficients.clone(), rhs)?;

        Ok(GomoryCut {
            name,
            source_row: row,
            coefficients,
            rhs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{ConstraintOp, SignRestriction};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn sample() -> LinearProgram {
        LinearProgram::maximize(vec![8.0, 5.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Le, 6.0)
            .subject_to(vec![9.0, 5.0], ConstraintOp::Le, 45.0)
            .with_restrictions(vec![SignRestriction::Integer, SignRestriction::Integer])
    }

    #[test]
    fn test_cuts_reach_integer_optimum() {
        let outcome = CuttingPlane::default().solve(&sample()).unwrap();

        assert!(!outcome.cuts.is_empty());
        assert_close(outcome.solution.objective_value, 40.0);
        assert_close(outcome.solution.values[0], 5.0);
        assert_close(outcome.solution.values[1], 0.0);
        assert!(outcome.tableau.has_integral_rhs(1e-6));
        assert_eq!(outcome.tableau.column_index("c1"), Some(4));
    }

    #[test]
    fn test_first_cut_is_logged_before_dual_pivots() {
        let outcome = CuttingPlane::default().solve(&sample()).unwrap();
        let first_cut = &outcome.cuts[0];

        let snapshot = outcome
            .iterations
            .iter()
            .find(|t| t.column_index("c1").is_some())
            .unwrap();
        let last_row = snapshot.num_rows() - 1;
        assert_eq!(snapshot.row(last_row), first_cut.coefficients.as_slice());
        assert!(snapshot.rhs(last_row) < 0.0);
        assert!(first_cut.coefficients.iter().all(|&a| a <= 1.0));
    }

    #[test]
    fn test_integral_relaxation_needs_no_cut() {
        let program = LinearProgram::maximize(vec![3.0, 5.0])
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![0.0, 2.0], ConstraintOp::Le, 12.0)
            .subject_to(vec![3.0, 2.0], ConstraintOp::Le, 18.0);

        let outcome = CuttingPlane::default().solve(&program).unwrap();
        assert!(outcome.cuts.is_empty());
        assert_close(outcome.solution.objective_value, 36.0);
    }

    #[test]
    fn test_cut_budget() {
        let solver = CuttingPlane::new(SolverOptions::new().with_max_cuts(0));
        assert_eq!(
            solver.solve(&sample()),
            Err(SolveError::CyclingLimitExceeded { iterations: 0 })
        );
    }
}
