use lpsolve_solver::SolveError;
use thiserror::Error;

/// Errors raised while reading a text model. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Model needs an objective line and a sign-restriction line, found {found} line(s)")]
    MissingSections { found: usize },
    #[error("Line {line}: objective has no coefficients")]
    EmptyObjective { line: usize },
    #[error("Line {line}: expected 'max' or 'min', found '{found}'")]
    InvalidSense { line: usize, found: String },
    #[error("Line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },
    #[error("Line {line}: expected <=, >= or =, found '{found}'")]
    InvalidRelation { line: usize, found: String },
    #[error("Line {line}: expected {expected} tokens, found {found}")]
    MissingTokens {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Line {line}: unknown sign restriction '{token}', expected +, -, urs, int or bin")]
    InvalidRestriction { line: usize, token: String },
    #[error("Knapsack capacity missing: add a 'capacity=<number>' line or pass one explicitly")]
    MissingCapacity,
    #[error("Line {line}: unknown directive '{directive}'")]
    InvalidDirective { line: usize, directive: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

impl From<ParseError> for SolveError {
    fn from(err: ParseError) -> Self {
        SolveError::MalformedInput(err.to_string())
    }
}

/// Parses a finite number; `inf` and `NaN` are rejected.
pub(crate) fn parse_number(token: &str, line: usize) -> ParseResult<f64> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseError::InvalidNumber {
            line,
            token: token.to_string(),
        }),
    }
}

/// Non-blank lines that are not `#` comments, with their 1-based numbers.
pub(crate) fn content_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, text)| (i + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
}
