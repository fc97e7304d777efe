use log::{debug, warn};
use lpsolve_solver::{Constraint, ConstraintOp, LinearProgram, Sense, SignRestriction};

use crate::error::{content_lines, parse_number, ParseError, ParseResult};

/// Reader for the line-oriented model format:
///
/// ```text
/// max 3 5
/// 1 0 <= 4
/// 0 2 <= 12
/// 3 2 <= 18
/// + +
/// ```
///
/// The first line holds the sense and objective, the last line one sign
/// restriction per variable, and every line in between a constraint.
pub struct ModelParser;

impl ModelParser {
    pub fn parse(source: &str) -> ParseResult<LinearProgram> {
        let lines: Vec<(usize, &str)> = content_lines(source).collect();
        if lines.len() < 2 {
            return Err(ParseError::MissingSections { found: lines.len() });
        }

        let (sense, objective) = Self::parse_objective(lines[0])?;
        let n = objective.len();
        let mut program = LinearProgram::new(sense, objective);

        for &(line, text) in &lines[1..lines.len() - 1] {
            program.constraints.push(Self::parse_constraint(line, text, n)?);
        }
        program.restrictions = Self::parse_restrictions(lines[lines.len() - 1], n)?;

        debug!(
            "parsed model: {} variables, {} constraints",
            program.num_variables(),
            program.num_constraints()
        );
        Ok(program)
    }

    fn parse_objective((line, text): (usize, &str)) -> ParseResult<(Sense, Vec<f64>)> {
        let mut tokens = text.split_whitespace();
        let sense = match tokens.next().map(str::to_ascii_lowercase).as_deref() {
            Some("max") => Sense::Maximize,
            Some("min") => Sense::Minimize,
            other => {
                return Err(ParseError::InvalidSense {
                    line,
                    found: other.unwrap_or_default().to_string(),
                });
            }
        };
        let objective = tokens
            .map(|token| parse_number(token, line))
            .collect::<ParseResult<Vec<f64>>>()?;
        if objective.is_empty() {
            return Err(ParseError::EmptyObjective { line });
        }
        Ok((sense, objective))
    }

    fn parse_constraint(line: usize, text: &str, n: usize) -> ParseResult<Constraint> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != n + 2 {
            return Err(ParseError::MissingTokens {
                line,
                expected: n + 2,
                found: tokens.len(),
            });
        }

        let coefficients = tokens[..n]
            .iter()
            .map(|token| parse_number(token, line))
            .collect::<ParseResult<Vec<f64>>>()?;
        let op = tokens[n]
            .parse::<ConstraintOp>()
            .map_err(|_| ParseError::InvalidRelation {
                line,
                found: tokens[n].to_string(),
            })?;
        let rhs = parse_number(tokens[n + 1], line)?;
        Ok(Constraint::new(coefficients, op, rhs))
    }

    fn parse_restrictions((line, text): (usize, &str), n: usize) -> ParseResult<Vec<SignRestriction>> {
        let mut restrictions = text
            .split_whitespace()
            .map(|token| {
                token
                    .to_ascii_lowercase()
                    .parse::<SignRestriction>()
                    .map_err(|_| ParseError::InvalidRestriction {
                        line,
                        token: token.to_string(),
                    })
            })
            .collect::<ParseResult<Vec<_>>>()?;

        if restrictions.len() != n {
            warn!(
                "line {line}: {} sign restrictions for {n} variables, {}",
                restrictions.len(),
                if restrictions.len() < n { "padding with '+'" } else { "ignoring the extra ones" }
            );
            restrictions.resize(n, SignRestriction::NonNegative);
        }
        Ok(restrictions)
    }
}
