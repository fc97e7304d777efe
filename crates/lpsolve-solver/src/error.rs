use thiserror::Error;

/// Failure kinds shared by every engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Unbounded: no limiting ratio for the entering column")]
    Unbounded,
    #[error("Infeasible: no feasible solution exists")]
    Infeasible,
    #[error("Singular basis: the detected basis matrix cannot be inverted")]
    SingularBasis,
    #[error("Iteration limit of {iterations} reached before optimality")]
    CyclingLimitExceeded { iterations: usize },
}

pub type SolveResult<T> = Result<T, SolveError>;

impl SolveError {
    pub fn malformed(message: impl Into<String>) -> Self {
        SolveError::MalformedInput(message.into())
    }

    /// Whether a search engine may fathom a subproblem that failed this way.
    pub fn is_fathomable(&self) -> bool {
        matches!(self, SolveError::Infeasible | SolveError::Unbounded)
    }
}
