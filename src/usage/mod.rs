//! Advisory token and cost estimation.
//!
//! Both estimators are pure functions: the manager consults them after a call
//! completes, and the CLI exposes them through `subagent estimate`.

pub mod cost;
pub mod tokens;

pub use cost::{CostBreakdown, CostCalculator};
pub use tokens::TokenCounter;

use serde::Serialize;

/// Prompt-side estimate for a piece of text, as printed by `subagent estimate`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextEstimate {
    pub model: String,
    pub tokens: u64,
    #[serde(flatten)]
    pub cost: CostBreakdown,
    pub priced: bool,
}

impl TextEstimate {
    /// Treats all of `text` as input; output tokens are zero.
    pub fn for_text(model: &str, text: &str) -> Self {
        let tokens = TokenCounter::count_tokens(text);
        Self {
            model: model.to_string(),
            tokens,
            cost: CostCalculator::calculate(model, tokens, 0),
            priced: CostCalculator::rates(model).is_some(),
        }
    }
}
