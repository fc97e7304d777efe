use log::debug;
use lpsolve_solver::{KnapsackItem, KnapsackProblem, SolveResult};

use crate::error::{content_lines, parse_number, ParseError, ParseResult};

/// Contents of a knapsack item file before a capacity is settled.
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackFile {
    pub items: Vec<KnapsackItem>,
    /// Value of the `capacity=` directive, if present
    pub capacity: Option<f64>,
}

impl KnapsackFile {
    /// Builds the problem; an explicit `capacity` takes precedence over the
    /// file's directive.
    pub fn into_problem(self, capacity: Option<f64>) -> SolveResult<KnapsackProblem> {
        let capacity = capacity.or(self.capacity).ok_or(ParseError::MissingCapacity)?;
        KnapsackProblem::new(self.items, capacity)
    }
}

/// Reader for `index value weight` item lines with an optional
/// `capacity=<number>` directive.
pub struct KnapsackParser;

impl KnapsackParser {
    pub fn parse(source: &str) -> ParseResult<KnapsackFile> {
        let mut items = Vec::new();
        let mut capacity = None;

        for (line, text) in content_lines(source) {
            if let Some((key, value)) = text.split_once('=') {
                let key = key.trim();
                if !key.eq_ignore_ascii_case("capacity") {
                    return Err(ParseError::InvalidDirective {
                        line,
                        directive: key.to_string(),
                    });
                }
                capacity = Some(parse_number(value.trim(), line)?);
                continue;
            }

            let tokens: Vec<&str> = text.split_whitespace().collect();
            if tokens.len() != 3 {
                return Err(ParseError::MissingTokens {
                    line,
                    expected: 3,
                    found: tokens.len(),
                });
            }
            let index = tokens[0].parse::<usize>().map_err(|_| ParseError::InvalidNumber {
                line,
                token: tokens[0].to_string(),
            })?;
            let value = parse_number(tokens[1], line)?;
            let weight = parse_number(tokens[2], line)?;
            items.push(KnapsackItem::new(index, value, weight));
        }

        debug!("parsed {} knapsack items, capacity {capacity:?}", items.len());
        Ok(KnapsackFile { items, capacity })
    }

    /// Parses and validates in one step.
    pub fn load(source: &str, capacity: Option<f64>) -> SolveResult<KnapsackProblem> {
        Self::parse(source)?.into_problem(capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpsolve_solver::SolveError;

    const CLASSIC: &str = "\
# index value weight
capacity=50
1 60 10
2 100 20
3 120 30
";

    #[test]
    fn test_parse_items_and_capacity() {
        let file = KnapsackParser::parse(CLASSIC).unwrap();
        assert_eq!(file.capacity, Some(50.0));
        assert_eq!(file.items.len(), 3);
        assert_eq!(file.items[1], KnapsackItem::new(2, 100.0, 20.0));
    }

    #[test]
    fn test_explicit_capacity_wins() {
        let problem = KnapsackParser::load(CLASSIC, Some(30.0)).unwrap();
        assert_eq!(problem.capacity, 30.0);

        let problem = KnapsackParser::load("1 5 2\ncapacity = 4\n", None).unwrap();
        assert_eq!(problem.capacity, 4.0);
    }

    #[test]
    fn test_missing_capacity() {
        let err = KnapsackParser::load("1 5 2\n", None).unwrap_err();
        assert_eq!(err, SolveError::from(ParseError::MissingCapacity));
    }

    #[test]
    fn test_malformed_lines() {
        assert_eq!(
            KnapsackParser::parse("budget=10\n"),
            Err(ParseError::InvalidDirective {
                line: 1,
                directive: "budget".to_string()
            })
        );
        assert_eq!(
            KnapsackParser::parse("capacity=10\n1 5\n"),
            Err(ParseError::MissingTokens {
                line: 2,
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            KnapsackParser::parse("1.5 5 2\n"),
            Err(ParseError::InvalidNumber {
                line: 1,
                token: "1.5".to_string()
            })
        );
    }

    #[test]
    fn test_non_positive_weight_is_rejected_by_the_model() {
        let err = KnapsackParser::load("capacity=10\n1 5 0\n", None).unwrap_err();
        assert!(matches!(err, SolveError::MalformedInput(_)));
    }
}
