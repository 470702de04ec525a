use crate::state::GameState;
use doninai_types::catalog::{COPPER, GOLD, MINE, PROVINCE, SILVER};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Action card the gated strategy adds to its deck, at most once.
pub const ENGINE_CARD: &str = MINE;

/// Lowest treasure at which the gated strategy buys [ENGINE_CARD].
pub const ENGINE_COST: u32 = 5;

/// Buy policy, fixed for the whole session.
///
/// Both variants walk a descending ladder of treasure thresholds where each
/// matching rung overwrites the previous choice, so the lowest matching
/// threshold wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Always spends down to Copper.
    Baseline,
    /// Picks up one [ENGINE_CARD] and never buys below Silver.
    Gated,
}

impl Strategy {
    /// Default variant for a player: odd seats play baseline, even seats gated.
    pub fn for_player(player: u32) -> Self {
        if player % 2 == 1 {
            Strategy::Baseline
        } else {
            Strategy::Gated
        }
    }

    /// Cards to buy this phase, in order. Empty means buy nothing.
    pub fn decide(&self, state: &GameState) -> Vec<String> {
        let treasure = state.treasure;
        let buy = match self {
            Strategy::Baseline => {
                let mut buy = PROVINCE;
                if treasure < 8 {
                    buy = GOLD;
                }
                if treasure < 6 {
                    buy = SILVER;
                }
                if treasure < 3 {
                    buy = COPPER;
                }
                Some(buy)
            }
            Strategy::Gated => {
                let mut buy = Some(PROVINCE);
                if treasure < 8 {
                    buy = Some(GOLD);
                }
                if treasure < 6 {
                    buy = Some(SILVER);
                }
                if (ENGINE_COST..6).contains(&treasure) && !state.deck_contains(ENGINE_CARD) {
                    buy = Some(ENGINE_CARD);
                }
                if treasure < 3 {
                    buy = None;
                }
                buy
            }
        };
        buy.into_iter().map(str::to_string).collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Baseline => "baseline",
            Strategy::Gated => "gated",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baseline" => Ok(Strategy::Baseline),
            "gated" => Ok(Strategy::Gated),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}
