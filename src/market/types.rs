//! Market metadata types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Binary market outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Outcome {
    /// YES outcome.
    Yes,
    /// NO outcome.
    No,
}

/// A tradable prediction market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Market identifier.
    pub id: String,
    /// Human-readable question.
    pub title: String,
    /// Token ID of the YES outcome, the side this strategy quotes.
    pub yes_token_id: String,
}
