use doninai_types::{catalog, StatePatch};
use std::collections::BTreeMap;
use tracing::trace;

pub const DEFAULT_BUYS: u32 = 1;
pub const DEFAULT_ACTIONS: u32 = 1;
pub const DEFAULT_TREASURE: u32 = 0;

/// The bot's view of one match.
///
/// `hand`, `supply` and `discard_count` are whatever the server last said.
/// `deck` is a local approximation: it starts as the starting deck and only
/// grows with our own purchases, so it drifts from the server's deck once
/// cards are trashed or gained by other means.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    pub hand: Vec<String>,
    pub discard_count: u32,
    pub deck: Vec<String>,
    pub supply: BTreeMap<String, u32>,
    pub buys: u32,
    pub actions: u32,
    pub treasure: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            hand: Vec::new(),
            discard_count: 0,
            deck: catalog::starting_deck(),
            supply: BTreeMap::new(),
            buys: DEFAULT_BUYS,
            actions: DEFAULT_ACTIONS,
            treasure: DEFAULT_TREASURE,
        }
    }

    /// Merge a server update. Fields absent from the patch keep their value.
    pub fn apply(&mut self, patch: StatePatch) {
        trace!(?patch, "Apply patch");
        if let Some(hand) = patch.hand {
            self.hand = hand;
        }
        if let Some(discard_count) = patch.discard_count {
            self.discard_count = discard_count;
        }
        if let Some(supply) = patch.supply {
            self.supply = supply;
        }
        if let Some(buys) = patch.buys {
            self.buys = buys;
        }
        if let Some(actions) = patch.actions {
            self.actions = actions;
        }
        if let Some(treasure) = patch.treasure {
            self.treasure = treasure;
        }
    }

    /// Reset the per-turn counters and merge the turn's opening state.
    pub fn begin_turn(&mut self, patch: StatePatch) {
        self.buys = DEFAULT_BUYS;
        self.actions = DEFAULT_ACTIONS;
        self.treasure = DEFAULT_TREASURE;
        self.apply(patch);
    }

    /// Mean treasure value of a card drawn from the (approximate) deck.
    pub fn average_draw_value(&self) -> f64 {
        if self.deck.is_empty() {
            return 0.0;
        }
        let total: u32 = self.deck.iter().map(|card| catalog::value_of(card)).sum();
        f64::from(total) / self.deck.len() as f64
    }

    pub fn record_buy(&mut self, card: &str) {
        self.deck.push(card.to_string());
    }

    pub fn deck_contains(&self, card: &str) -> bool {
        self.deck.iter().any(|owned| owned == card)
    }

    /// Whether the supply allows buying `card`.
    ///
    /// Until the server reports a supply at all, every card is assumed to be
    /// available; afterwards unlisted cards count as sold out.
    pub fn in_stock(&self, card: &str) -> bool {
        if self.supply.is_empty() {
            return true;
        }
        self.supply.get(card).is_some_and(|count| *count > 0)
    }

    /// Remove the first copy of `card` from the hand.
    pub fn take_from_hand(&mut self, card: &str) -> bool {
        match self.hand.iter().position(|held| held == card) {
            Some(index) => {
                self.hand.remove(index);
                true
            }
            None => false,
        }
    }
}
