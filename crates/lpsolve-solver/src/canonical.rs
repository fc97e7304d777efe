use crate::error::SolveResult;
use crate::problem::{ConstraintOp, LinearProgram, SignRestriction};
use crate::tableau::{Column, ColumnKind, Convention, Tableau};

/// Builds the initial simplex tableau of a program.
///
/// Minimization is converted by negating the objective first, so row 0
/// always holds the negated maximization coefficients. `-` variables are
/// substituted by a negated column, `urs` variables are split into a
/// positive column and a negated `_neg` column, and every `bin` variable
/// gets an extra `x <= 1` row with slack `u{i}`.
pub struct CanonicalForm;

/// Where a constraint row of the canonical form came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOrigin {
    /// First auxiliary column of the row (`s2`, `e3`, `u1`, ...)
    pub name: String,
    /// Model constraint index; `None` for the `x <= 1` row of a `bin` variable
    pub constraint: Option<usize>,
    /// The canonical row equals `sign` times the model row
    pub sign: f64,
}

struct RowLayout {
    coefficients: Vec<f64>,
    rhs: f64,
    /// (auxiliary column, coefficient in this row)
    auxiliary: Vec<(usize, f64)>,
    constraint: Option<usize>,
    sign: f64,
}

impl CanonicalForm {
    pub fn build(program: &LinearProgram, convention: Convention) -> SolveResult<Tableau> {
        Self::build_with_origins(program, convention).map(|(tableau, _)| tableau)
    }

    /// Like [`CanonicalForm::build`], also returning one [`RowOrigin`] per
    /// constraint row.
    pub fn build_with_origins(
        program: &LinearProgram,
        convention: Convention,
    ) -> SolveResult<(Tableau, Vec<RowOrigin>)> {
        program.validate()?;
        let n_vars = program.num_variables();
        let objective = program.max_objective();

        // Decision columns with the sign they carry their variable with
        let mut columns = Vec::new();
        let mut signs = Vec::new();
        for i in 0..n_vars {
            let name = LinearProgram::variable_name(i);
            match program.restriction(i) {
                SignRestriction::NonPositive => {
                    columns.push(Column::new(name, ColumnKind::Decision { variable: i, negated: true }));
                    signs.push((i, -1.0));
                }
                SignRestriction::Unrestricted => {
                    columns.push(Column::new(
                        name.clone(),
                        ColumnKind::Decision { variable: i, negated: false },
                    ));
                    signs.push((i, 1.0));
                    columns.push(Column::new(
                        format!("{name}_neg"),
                        ColumnKind::Decision { variable: i, negated: true },
                    ));
                    signs.push((i, -1.0));
                }
                _ => {
                    columns.push(Column::new(name, ColumnKind::Decision { variable: i, negated: false }));
                    signs.push((i, 1.0));
                }
            }
        }
        let project = |coefficients: &[f64]| -> Vec<f64> {
            signs.iter().map(|&(i, sign)| coefficients[i] * sign).collect()
        };

        let mut aux_columns: Vec<Column> = Vec::new();
        let mut rows: Vec<RowLayout> = Vec::new();

        for (j, constraint) in program.constraints.iter().enumerate() {
            let tag = j + 1;
            let coefficients = project(&constraint.coefficients);
            match convention {
                Convention::Primal => {
                    let (coefficients, op, rhs, sign) = if constraint.rhs < 0.0 {
                        (
                            coefficients.iter().map(|a| -a).collect(),
                            constraint.op.flipped(),
                            -constraint.rhs,
                            -1.0,
                        )
                    } else {
                        (coefficients, constraint.op, constraint.rhs, 1.0)
                    };
                    let mut auxiliary = Vec::new();
                    match op {
                        ConstraintOp::Le => {
                            auxiliary.push((aux_columns.len(), 1.0));
                            aux_columns.push(Column::new(format!("s{tag}"), ColumnKind::Slack));
                        }
                        ConstraintOp::Ge => {
                            auxiliary.push((aux_columns.len(), -1.0));
                            aux_columns.push(Column::new(format!("e{tag}"), ColumnKind::Surplus));
                            auxiliary.push((aux_columns.len(), 1.0));
                            aux_columns.push(Column::new(format!("a{tag}"), ColumnKind::Artificial));
                        }
                        ConstraintOp::Eq => {
                            auxiliary.push((aux_columns.len(), 1.0));
                            aux_columns.push(Column::new(format!("a{tag}"), ColumnKind::Artificial));
                        }
                    }
                    rows.push(RowLayout {
                        coefficients,
                        rhs,
                        auxiliary,
                        constraint: Some(j),
                        sign,
                    });
                }
                Convention::Dual => {
                    if matches!(constraint.op, ConstraintOp::Le | ConstraintOp::Eq) {
                        rows.push(RowLayout {
                            coefficients: coefficients.clone(),
                            rhs: constraint.rhs,
                            auxiliary: vec![(aux_columns.len(), 1.0)],
                            constraint: Some(j),
                            sign: 1.0,
                        });
                        aux_columns.push(Column::new(format!("s{tag}"), ColumnKind::Slack));
                    }
                    if matches!(constraint.op, ConstraintOp::Ge | ConstraintOp::Eq) {
                        rows.push(RowLayout {
                            coefficients: coefficients.iter().map(|a| -a).collect(),
                            rhs: -constraint.rhs,
                            auxiliary: vec![(aux_columns.len(), 1.0)],
                            constraint: Some(j),
                            sign: -1.0,
                        });
                        aux_columns.push(Column::new(format!("e{tag}"), ColumnKind::Surplus));
                    }
                }
            }
        }

        for i in 0..n_vars {
            if program.restriction(i) == SignRestriction::Binary {
                let mut unit = vec![0.0; n_vars];
                unit[i] = 1.0;
                rows.push(RowLayout {
                    coefficients: project(&unit),
                    rhs: 1.0,
                    auxiliary: vec![(aux_columns.len(), 1.0)],
                    constraint: None,
                    sign: 1.0,
                });
                aux_columns.push(Column::new(format!("u{}", i + 1), ColumnKind::Slack));
            }
        }

        let n_decision = columns.len();
        let n_aux = aux_columns.len();
        columns.extend(aux_columns);
        let mut tableau = Tableau::new(convention, columns)?;

        let mut objective_row = vec![0.0; n_decision + n_aux];
        for (col, &(i, sign)) in signs.iter().enumerate() {
            objective_row[col] = -objective[i] * sign;
        }
        tableau.set_objective_row(objective_row, 0.0)?;

        let mut origins = Vec::with_capacity(rows.len());
        for layout in rows {
            let name = layout
                .auxiliary
                .first()
                .map(|&(aux, _)| tableau.column(n_decision + aux).name.clone())
                .unwrap_or_default();
            origins.push(RowOrigin {
                name,
                constraint: layout.constraint,
                sign: layout.sign,
            });

            let mut row = layout.coefficients;
            row.resize(n_decision + n_aux, 0.0);
            for (aux, coef) in layout.auxiliary {
                row[n_decision + aux] = coef;
            }
            tableau.push_row(row, layout.rhs)?;
        }

        Ok((tableau, origins))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tableau::RHS;

    fn names(tableau: &Tableau) -> Vec<&str> {
        tableau.columns().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_objective_row_negates_maximization() {
        let program = LinearProgram::maximize(vec![3.0, 5.0])
            .subject_to(vec![1.0, 0.0], ConstraintOp::Le, 4.0)
            .subject_to(vec![0.0, 2.0], ConstraintOp::Le, 12.0);

        let t = CanonicalForm::build(&program, Convention::Primal).unwrap();
        assert_eq!(names(&t), vec!["x1", "x2", "s1", "s2"]);
        assert_eq!(t.objective_row(), &[-3.0, -5.0, 0.0, 0.0]);
        assert_eq!(t.get(0, RHS), Some(0.0));
        assert_eq!(t.get(2, "s2"), Some(1.0));
        assert_eq!(t.get(2, "s1"), Some(0.0));
        assert_eq!(t.get(2, RHS), Some(12.0));
    }

    #[test]
    fn test_minimization_is_negated_before_canonicalizing() {
        let program = LinearProgram::minimize(vec![2.0, 3.0]).subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        let t = CanonicalForm::build(&program, Convention::Dual).unwrap();
        assert_eq!(t.objective_row(), &[2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_primal_convention_adds_surplus_and_artificial() {
        let program = LinearProgram::maximize(vec![1.0, 1.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 2.0)
            .subject_to(vec![1.0, -1.0], ConstraintOp::Eq, 1.0)
            .subject_to(vec![1.0, 2.0], ConstraintOp::Le, -3.0);

        let t = CanonicalForm::build(&program, Convention::Primal).unwrap();
        assert_eq!(names(&t), vec!["x1", "x2", "e1", "a1", "a2", "e3", "a3"]);
        assert_eq!(t.row(1), &[1.0, 1.0, -1.0, 1.0, 0.0, 0.0, 0.0]);
        // negative RHS row is flipped into a >= row
        assert_eq!(t.row(3), &[-1.0, -2.0, 0.0, 0.0, 0.0, -1.0, 1.0]);
        assert_eq!(t.rhs(3), 3.0);
        assert!(t.has_artificial());
    }

    #[test]
    fn test_dual_convention_negates_ge_and_splits_eq() {
        let program = LinearProgram::minimize(vec![1.0, 1.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 2.0)
            .subject_to(vec![1.0, -1.0], ConstraintOp::Eq, 1.0);

        let t = CanonicalForm::build(&program, Convention::Dual).unwrap();
        assert_eq!(names(&t), vec!["x1", "x2", "e1", "s2", "e2"]);
        assert_eq!(t.num_constraints(), 3);
        assert_eq!(t.row(1), &[-1.0, -1.0, 1.0, 0.0, 0.0]);
        assert_eq!(t.rhs(1), -2.0);
        assert_eq!(t.row(2), &[1.0, -1.0, 0.0, 1.0, 0.0]);
        assert_eq!(t.row(3), &[-1.0, 1.0, 0.0, 0.0, 1.0]);
        assert_eq!(t.rhs(3), -1.0);
        assert!(!t.has_artificial());
    }

    #[test]
    fn test_sign_restrictions_substitute_columns() {
        let program = LinearProgram::maximize(vec![2.0, 1.0, 4.0])
            .subject_to(vec![1.0, 1.0, 1.0], ConstraintOp::Le, 5.0)
            .with_restrictions(vec![
                SignRestriction::NonPositive,
                SignRestriction::Unrestricted,
                SignRestriction::Binary,
            ]);

        let t = CanonicalForm::build(&program, Convention::Dual).unwrap();
        assert_eq!(names(&t), vec!["x1", "x2", "x2_neg", "x3", "s1", "u3"]);
        assert_eq!(t.objective_row(), &[2.0, -1.0, 1.0, -4.0, 0.0, 0.0]);
        assert_eq!(t.row(1), &[-1.0, 1.0, -1.0, 1.0, 1.0, 0.0]);
        assert_eq!(t.row(2), &[0.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(t.rhs(2), 1.0);
    }

    #[test]
    fn test_row_origins_track_negated_rows() {
        let program = LinearProgram::maximize(vec![1.0, 1.0])
            .subject_to(vec![1.0, 1.0], ConstraintOp::Ge, 2.0)
            .subject_to(vec![1.0, -1.0], ConstraintOp::Eq, 1.0)
            .with_restrictions(vec![SignRestriction::Binary, SignRestriction::NonNegative]);

        let (_, origins) = CanonicalForm::build_with_origins(&program, Convention::Dual).unwrap();
        let summary: Vec<_> = origins
            .iter()
            .map(|o| (o.name.as_str(), o.constraint, o.sign))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("e1", Some(0), -1.0),
                ("s2", Some(1), 1.0),
                ("e2", Some(1), -1.0),
                ("u1", None, 1.0),
            ]
        );
    }

    #[test]
    fn test_rejects_invalid_program() {
        let program = LinearProgram::maximize(vec![]);
        assert!(CanonicalForm::build(&program, Convention::Primal).is_err());
    }
}
