//! Static per-model pricing.
//!
//! Rates are dollars per 1000 tokens. A model matches its exact entry or the
//! longest entry it starts with, so dated snapshots such as
//! `claude-3-haiku-20240307` resolve to their family. Unknown models cost 0.

use serde::Serialize;

/// `(model prefix, input rate, output rate)` in dollars per 1000 tokens.
const PRICING: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.000_15, 0.000_6),
    ("gpt-4o", 0.002_5, 0.01),
    ("gpt-4-turbo", 0.01, 0.03),
    ("gpt-4", 0.03, 0.06),
    ("gpt-3.5-turbo", 0.000_5, 0.001_5),
    ("o1-mini", 0.003, 0.012),
    ("o1", 0.015, 0.06),
    ("claude-3-5-sonnet", 0.003, 0.015),
    ("claude-3-5-haiku", 0.000_8, 0.004),
    ("claude-3-opus", 0.015, 0.075),
    ("claude-3-sonnet", 0.003, 0.015),
    ("claude-3-haiku", 0.000_25, 0.001_25),
];

/// Cost of one call, split by direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

pub struct CostCalculator;

impl CostCalculator {
    /// Input and output rates for `model`, if it is priced.
    pub fn rates(model: &str) -> Option<(f64, f64)> {
        PRICING
            .iter()
            .filter(|(prefix, _, _)| model.starts_with(prefix))
            .max_by_key(|(prefix, _, _)| prefix.len())
            .map(|&(_, input, output)| (input, output))
    }

    pub fn calculate(model: &str, input_tokens: u64, output_tokens: u64) -> CostBreakdown {
        let Some((input_rate, output_rate)) = Self::rates(model) else {
            return CostBreakdown::default();
        };

        let input_cost = input_tokens as f64 / 1000.0 * input_rate;
        let output_cost = output_tokens as f64 / 1000.0 * output_rate;

        CostBreakdown {
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }
}
