//! Arithmetic problem generation
//!
//! Pure and stateless: every function takes the random source as a parameter,
//! so a seeded `StdRng` reproduces the same problem sequence.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value_objects::Difficulty;

/// Arithmetic operation of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Multiplication,
    Addition,
    Subtraction,
}

impl Operation {
    /// Compute the result of applying this operation to two operands
    pub fn apply(self, left: i64, right: i64) -> i64 {
        match self {
            Operation::Multiplication => left * right,
            Operation::Addition => left + right,
            Operation::Subtraction => left - right,
        }
    }

    /// Get the display symbol for this operation
    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Multiplication => "×",
            Operation::Addition => "+",
            Operation::Subtraction => "-",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Multiplication => write!(f, "multiplication"),
            Operation::Addition => write!(f, "addition"),
            Operation::Subtraction => write!(f, "subtraction"),
        }
    }
}

/// One round's question. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub factor1: i64,
    pub factor2: i64,
    pub answer: i64,
    pub operation: Operation,
}

impl Problem {
    pub fn new(operation: Operation, factor1: i64, factor2: i64) -> Self {
        Self {
            factor1,
            factor2,
            answer: operation.apply(factor1, factor2),
            operation,
        }
    }

    /// Parse a typed answer and compare it with the solution.
    ///
    /// Anything that is not a whole integer after trimming counts as wrong.
    pub fn check(&self, input: &str) -> bool {
        parse_answer(input) == Some(self.answer)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.factor1,
            self.operation.symbol(),
            self.factor2
        )
    }
}

/// Parse a player's typed answer. Empty or non-numeric input yields `None`.
pub fn parse_answer(input: &str) -> Option<i64> {
    input.trim().parse::<i64>().ok()
}

/// Generate a problem with operands drawn uniformly from `[1, max_operand]`.
///
/// Subtraction without `allow_negative` draws the second operand from
/// `[1, first]`, so the answer is never negative.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    operation: Operation,
    max_operand: u32,
    allow_negative: bool,
) -> Problem {
    let max = i64::from(max_operand.max(1));
    let factor1 = rng.gen_range(1..=max);
    let factor2 = if operation == Operation::Subtraction && !allow_negative {
        rng.gen_range(1..=factor1)
    } else {
        rng.gen_range(1..=max)
    };
    Problem::new(operation, factor1, factor2)
}

/// Generate a problem scaled to a 1-10 difficulty.
///
/// | Difficulty | Operation                                   | Operand bound             |
/// |------------|---------------------------------------------|---------------------------|
/// | 1-3        | multiplication                              | `min(5 + d, 10)`          |
/// | 4-7        | 70% multiplication, else addition/subtraction | `min(d + 3, 12)` / `10 + 3d` |
/// | 8-10       | multiplication                              | `min(10 + (d - 7) * 2, 20)` |
pub fn generate_by_difficulty<R: Rng + ?Sized>(rng: &mut R, difficulty: Difficulty) -> Problem {
    let d = u32::from(difficulty.value());
    match d {
        0..=3 => generate(rng, Operation::Multiplication, (5 + d).min(10), false),
        4..=7 => {
            if rng.gen::<f64>() < 0.7 {
                generate(rng, Operation::Multiplication, (d + 3).min(12), false)
            } else {
                let operation = if rng.gen::<bool>() {
                    Operation::Addition
                } else {
                    Operation::Subtraction
                };
                generate(rng, operation, 10 + d * 3, false)
            }
        }
        _ => generate(
            rng,
            Operation::Multiplication,
            (10 + (d - 7) * 2).min(20),
            false,
        ),
    }
}

/// Upper operand bound for the problems a monster poses: `min(10, 4 + level)`.
pub fn max_factor_for_level(level: u32) -> u32 {
    (4 + level).min(10)
}
