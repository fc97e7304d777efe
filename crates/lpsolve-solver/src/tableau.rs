use std::collections::HashMap;
use std::fmt;

use crate::error::{SolveError, SolveResult};

/// Reserved name of the right-hand-side column.
pub const RHS: &str = "RHS";

/// Entries smaller than this are flushed to zero after a pivot.
const ROUNDOFF: f64 = 1e-12;

/// How `>=` and `=` rows were brought into canonical form.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// Surplus −1 plus an artificial column; every RHS non-negative.
    Primal,
    /// `>=` rows negated so the surplus is basic; `=` split in two rows.
    Dual,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Column carrying (part of) decision variable `variable`; a negated
    /// column contributes its value with opposite sign.
    Decision { variable: usize, negated: bool },
    Slack,
    Surplus,
    Artificial,
    /// Slack of a Gomory cut row
    Cut,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Dense simplex tableau. Row 0 is the objective row in maximization form
/// (coefficients are the negated objective, its RHS is the objective value);
/// rows 1..m are constraint rows.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct Tableau {
    convention: Convention,
    columns: Vec<Column>,
    #[cfg_attr(feature = "serde", serde(skip))]
    index: HashMap<String, usize>,
    rows: Vec<Vec<f64>>,
    rhs: Vec<f64>,
}

impl PartialEq for Tableau {
    fn eq(&self, other: &Self) -> bool {
        self.convention == other.convention
            && self.columns == other.columns
            && self.rows == other.rows
            && self.rhs == other.rhs
    }
}

impl Tableau {
    /// A tableau with the given columns and an all-zero objective row.
    pub fn new(convention: Convention, columns: Vec<Column>) -> SolveResult<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (j, column) in columns.iter().enumerate() {
            if column.name == RHS {
                return Err(SolveError::malformed("column name RHS is reserved"));
            }
            if index.insert(column.name.clone(), j).is_some() {
                return Err(SolveError::malformed(format!(
                    "duplicate column name {}",
                    column.name
                )));
            }
        }
        let width = columns.len();
        Ok(Self {
            convention,
            columns,
            index,
            rows: vec![vec![0.0; width]],
            rhs: vec![0.0],
        })
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, col: usize) -> &Column {
        &self.columns[col]
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows including the objective row.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.rows.len() - 1
    }

    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    pub fn rhs(&self, row: usize) -> f64 {
        self.rhs[row]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.rows[row]
    }

    pub fn objective_row(&self) -> &[f64] {
        &self.rows[0]
    }

    /// Max-space objective value of the current basic solution.
    pub fn objective_value(&self) -> f64 {
        self.rhs[0]
    }

    /// Entry of `row` in the column called `name`; `RHS` addresses the
    /// right-hand side.
    pub fn get(&self, row: usize, name: &str) -> Option<f64> {
        if row >= self.rows.len() {
            return None;
        }
        if name == RHS {
            return Some(self.rhs[row]);
        }
        self.column_index(name).map(|col| self.rows[row][col])
    }

    pub fn set_objective_row(&mut self, coefficients: Vec<f64>, rhs: f64) -> SolveResult<()> {
        self.check_width(&coefficients)?;
        self.rows[0] = coefficients;
        self.rhs[0] = rhs;
        Ok(())
    }

    pub fn push_row(&mut self, coefficients: Vec<f64>, rhs: f64) -> SolveResult<()> {
        self.check_width(&coefficients)?;
        self.rows.push(coefficients);
        self.rhs.push(rhs);
        Ok(())
    }

    /// Appends a column, zero in every existing row, and returns its index.
    pub fn push_column(&mut self, column: Column) -> SolveResult<usize> {
        if column.name == RHS || self.index.contains_key(&column.name) {
            return Err(SolveError::malformed(format!(
                "column name {} is already in use",
                column.name
            )));
        }
        let col = self.columns.len();
        self.index.insert(column.name.clone(), col);
        self.columns.push(column);
        for row in &mut self.rows {
            row.push(0.0);
        }
        Ok(col)
    }

    fn check_width(&self, coefficients: &[f64]) -> SolveResult<()> {
        if coefficients.len() != self.columns.len() {
            return Err(SolveError::malformed(format!(
                "row has {} entries, tableau has {} columns",
                coefficients.len(),
                self.columns.len()
            )));
        }
        Ok(())
    }

    /// Whether `col` may enter the basis.
    pub fn is_eligible(&self, col: usize) -> bool {
        self.columns[col].kind != ColumnKind::Artificial
    }

    pub fn has_artificial(&self) -> bool {
        self.columns.iter().any(|c| c.kind == ColumnKind::Artificial)
    }

    /// Gauss-Jordan pivot on (`row`, `col`): normalize the pivot row, then
    /// eliminate `col` from every other row including the objective row.
    pub fn pivot(&mut self, row: usize, col: usize) {
        let n_cols = self.columns.len();
        let pivot_val = self.rows[row][col];

        for j in 0..n_cols {
            self.rows[row][j] /= pivot_val;
        }
        self.rhs[row] /= pivot_val;
        self.rows[row][col] = 1.0;

        let pivot_row = self.rows[row].clone();
        let pivot_rhs = self.rhs[row];

        for i in 0..self.rows.len() {
            if i == row {
                continue;
            }
            let factor = self.rows[i][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n_cols {
                let updated = self.rows[i][j] - factor * pivot_row[j];
                self.rows[i][j] = if updated.abs() < ROUNDOFF { 0.0 } else { updated };
            }
            let updated = self.rhs[i] - factor * pivot_rhs;
            self.rhs[i] = if updated.abs() < ROUNDOFF { 0.0 } else { updated };
            self.rows[i][col] = 0.0;
        }
    }

    /// Eliminates `col` from the objective row using constraint row `row`,
    /// which must hold a 1 in that column.
    pub fn price_out(&mut self, row: usize, col: usize) {
        let factor = self.rows[0][col];
        if factor == 0.0 {
            return;
        }
        for j in 0..self.columns.len() {
            let updated = self.rows[0][j] - factor * self.rows[row][j];
            self.rows[0][j] = if updated.abs() < ROUNDOFF { 0.0 } else { updated };
        }
        self.rhs[0] -= factor * self.rhs[row];
        self.rows[0][col] = 0.0;
    }

    /// Row in which `col` is a unit column among the constraint rows:
    /// exactly one entry is 1 and every other entry is 0.
    pub fn unit_row(&self, col: usize, tolerance: f64) -> Option<usize> {
        let mut found = None;
        for i in 1..self.rows.len() {
            let v = self.rows[i][col];
            if (v - 1.0).abs() <= tolerance {
                if found.is_some() {
                    return None;
                }
                found = Some(i);
            } else if v.abs() > tolerance {
                return None;
            }
        }
        found
    }

    /// Row in which `col` is basic: a unit column whose objective entry is 0.
    pub fn basic_row(&self, col: usize, tolerance: f64) -> Option<usize> {
        if self.rows[0][col].abs() > tolerance {
            return None;
        }
        self.unit_row(col, tolerance)
    }

    /// First column that is basic in `row`.
    pub fn basic_column(&self, row: usize, tolerance: f64) -> Option<usize> {
        (0..self.columns.len()).find(|&col| self.basic_row(col, tolerance) == Some(row))
    }

    /// Basic column of each constraint row (index 0 is row 1). A row keeps
    /// only its first basic column, so duplicated unit columns never share
    /// one row's value.
    pub fn basis(&self, tolerance: f64) -> Vec<Option<usize>> {
        (1..self.rows.len())
            .map(|row| self.basic_column(row, tolerance))
            .collect()
    }

    /// Value of `col` in the current basic solution; 0 when non-basic.
    pub fn basic_value(&self, col: usize, tolerance: f64) -> f64 {
        Self::value_in(&self.basis(tolerance), &self.rhs, col)
    }

    fn value_in(basis: &[Option<usize>], rhs: &[f64], col: usize) -> f64 {
        basis
            .iter()
            .position(|&b| b == Some(col))
            .map_or(0.0, |i| rhs[i + 1])
    }

    /// Values of the decision variables x1..x`n_vars`, recombining split
    /// and negated columns.
    pub fn decision_values(&self, n_vars: usize, tolerance: f64) -> Vec<f64> {
        let basis = self.basis(tolerance);
        let mut values = vec![0.0; n_vars];
        for (col, column) in self.columns.iter().enumerate() {
            if let ColumnKind::Decision { variable, negated } = column.kind {
                if variable < n_vars {
                    let v = Self::value_in(&basis, &self.rhs, col);
                    values[variable] += if negated { -v } else { v };
                }
            }
        }
        values
    }

    /// Whether every constraint row's RHS is integral.
    pub fn has_integral_rhs(&self, tolerance: f64) -> bool {
        self.rhs[1..]
            .iter()
            .all(|v| (v - v.round()).abs() <= tolerance)
    }

    fn row_label(&self, row: usize) -> String {
        if row == 0 {
            return "z".to_string();
        }
        match self.basic_column(row, 1e-9) {
            Some(col) => self.columns[col].name.clone(),
            None => format!("r{row}"),
        }
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for column in &self.columns {
            write!(f, " {:>10}", column.name)?;
        }
        writeln!(f, " {:>10}", RHS)?;

        for (i, row) in self.rows.iter().enumerate() {
            write!(f, "{:>8}", self.row_label(i))?;
            for v in row {
                write!(f, " {:>10.4}", v)?;
            }
            writeln!(f, " {:>10.4}", self.rhs[i])?;
        }
        Ok(())
    }
}
