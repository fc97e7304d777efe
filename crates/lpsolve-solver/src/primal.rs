use log::{debug, info, warn};

use crate::canonical::CanonicalForm;
use crate::error::{SolveError, SolveResult};
use crate::options::SolverOptions;
use crate::problem::LinearProgram;
use crate::solution::{IterationLog, SimplexRun};
use crate::tableau::{ColumnKind, Convention, Tableau};

/// Tableau simplex with Dantzig's entering rule and a two-phase start.
///
/// Ties on the minimum ratio go to the row whose basic column has the lowest
/// index. A run of `degenerate_pivot_limit` consecutive zero-ratio pivots
/// switches the entering rule to Bland's rule for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct PrimalSimplex {
    options: SolverOptions,
}

impl PrimalSimplex {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Solve the program from its primal canonical form
    pub fn solve(&self, program: &LinearProgram) -> SolveResult<SimplexRun> {
        let tableau = CanonicalForm::build(program, Convention::Primal)?;
        let mut log = IterationLog::new();
        log.push(tableau.clone());

        let tableau = if tableau.has_artificial() {
            self.phase_one(tableau, &mut log)?
        } else {
            tableau
        };
        self.iterate(tableau, &mut log, "phase 2")?;

        let run = SimplexRun::new(program, log, self.options.tolerance)?;
        info!(
            "primal simplex: optimal z = {} after {} tableaux",
            run.solution.objective_value,
            run.iterations.len()
        );
        Ok(run)
    }

    /// Continue pivoting from a supplied tableau. The returned log starts
    /// with that tableau and ends with the optimal one.
    pub fn solve_from_tableau(&self, tableau: Tableau) -> SolveResult<IterationLog<Tableau>> {
        let mut log = IterationLog::new();
        log.push(tableau.clone());
        self.iterate(tableau, &mut log, "primal")?;
        Ok(log)
    }

    /// Maximizes −Σ artificials, then restores and prices out the saved
    /// objective row.
    fn phase_one(&self, mut tableau: Tableau, log: &mut IterationLog<Tableau>) -> SolveResult<Tableau> {
        let tol = self.options.tolerance;
        let saved_row = tableau.objective_row().to_vec();
        let saved_rhs = tableau.objective_value();

        let artificial: Vec<usize> = (0..tableau.num_columns())
            .filter(|&j| tableau.column(j).kind == ColumnKind::Artificial)
            .collect();
        let mut auxiliary = vec![0.0; tableau.num_columns()];
        for &j in &artificial {
            auxiliary[j] = 1.0;
        }
        tableau.set_objective_row(auxiliary, 0.0)?;
        for &j in &artificial {
            if let Some(row) = tableau.unit_row(j, tol) {
                tableau.price_out(row, j);
            }
        }
        log.push(tableau.clone());

        let mut tableau = self.iterate(tableau, log, "phase 1")?;
        let residual = -tableau.objective_value();
        if residual > self.options.feasibility_tolerance {
            info!("phase 1 ended with artificial mass {residual}: infeasible");
            return Err(SolveError::Infeasible);
        }

        self.drive_out_artificials(&mut tableau);

        let basis: Vec<(usize, usize)> = (1..tableau.num_rows())
            .filter_map(|row| tableau.basic_column(row, tol).map(|col| (row, col)))
            .collect();
        tableau.set_objective_row(saved_row, saved_rhs)?;
        for (row, col) in basis {
            tableau.price_out(row, col);
        }
        log.push(tableau.clone());
        Ok(tableau)
    }

    /// Pivots zero-level artificials out of the basis wherever their row has
    /// a usable non-artificial entry; rows without one are redundant.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let tol = self.options.tolerance;
        for row in 1..tableau.num_rows() {
            let Some(basic) = tableau.basic_column(row, tol) else {
                continue;
            };
            if tableau.is_eligible(basic) {
                continue;
            }
            let replacement = (0..tableau.num_columns())
                .find(|&j| tableau.is_eligible(j) && tableau.value(row, j).abs() > tol);
            match replacement {
                Some(col) => {
                    debug!(
                        "phase 1: {} replaces zero-level {} in row {row}",
                        tableau.column(col).name,
                        tableau.column(basic).name
                    );
                    tableau.pivot(row, col);
                }
                None => debug!("phase 1: row {row} is redundant"),
            }
        }
    }

    fn iterate(
        &self,
        mut tableau: Tableau,
        log: &mut IterationLog<Tableau>,
        stage: &str,
    ) -> SolveResult<Tableau> {
        let mut pivots = 0;
        let mut degenerate_run = 0;
        let mut bland = false;

        loop {
            let Some(col) = self.entering_column(&tableau, bland) else {
                debug!("{stage}: optimal after {pivots} pivots");
                return Ok(tableau);
            };
            if pivots == self.options.max_iterations {
                warn!("{stage}: pivot budget of {pivots} exhausted");
                return Err(SolveError::CyclingLimitExceeded { iterations: pivots });
            }
            let Some((row, ratio)) = self.leaving_row(&tableau, col) else {
                debug!("{stage}: {} has no limiting row", tableau.column(col).name);
                return Err(SolveError::Unbounded);
            };

            debug!(
                "{stage} pivot {}: {} enters at row {row}, ratio {ratio}",
                pivots + 1,
                tableau.column(col).name
            );
            if ratio <= self.options.tolerance {
                degenerate_run += 1;
                if !bland && degenerate_run >= self.options.degenerate_pivot_limit {
                    warn!("{stage}: {degenerate_run} degenerate pivots in a row, switching to Bland's rule");
                    bland = true;
                }
            } else {
                degenerate_run = 0;
            }

            tableau.pivot(row, col);
            log.push(tableau.clone());
            pivots += 1;
        }
    }

    /// Most negative eligible objective-row entry, or under Bland's rule the
    /// lowest-index negative one.
    fn entering_column(&self, tableau: &Tableau, bland: bool) -> Option<usize> {
        let tol = self.options.tolerance;
        let row0 = tableau.objective_row();
        let mut candidates = (0..tableau.num_columns()).filter(|&j| tableau.is_eligible(j) && row0[j] < -tol);

        if bland {
            return candidates.next();
        }
        let mut best: Option<usize> = None;
        for j in candidates {
            if best.is_none_or(|b| row0[j] < row0[b]) {
                best = Some(j);
            }
        }
        best
    }

    /// Minimum-ratio row for the entering column, with its ratio.
    fn leaving_row(&self, tableau: &Tableau, col: usize) -> Option<(usize, f64)> {
        let tol = self.options.tolerance;
        let mut best: Option<(usize, f64)> = None;

        for row in 1..tableau.num_rows() {
            let a = tableau.value(row, col);
            if a <= tol {
                continue;
            }
            let ratio = tableau.rhs(row).max(0.0) / a;
            best = match best {
                None => Some((row, ratio)),
                Some((_, min)) if ratio < min - tol => Some((row, ratio)),
                Some((current, min))
                    if (ratio - min).abs() <= tol
                        && self.basis_rank(tableau, row) < self.basis_rank(tableau, current) =>
                {
                    Some((row, ratio))
                }
                keep => keep,
            };
        }
        best
    }

    fn basis_rank(&self, tableau: &Tableau, row: usize) -> usize {
        tableau
            .basic_column(row, self.options.tolerance)
            .unwrap_or(usize::MAX)
    }
}
