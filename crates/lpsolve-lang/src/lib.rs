//! Text formats for `lpsolve`: the line-oriented LP/ILP model and the
//! knapsack item list.

mod error;
pub mod knapsack;
pub mod parser;

pub use error::{ParseError, ParseResult};
pub use knapsack::{KnapsackFile, KnapsackParser};
pub use parser::ModelParser;
