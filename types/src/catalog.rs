//! Static card attributes.
//!
//! The server owns the rules; the catalog only carries what the bot needs to
//! rank cards: purchasing power, discard preference and how an action card is
//! sequenced. Unknown names are never an error, they fall back to
//! [DEFAULT_DISCARD_WEIGHT] and are treated as non-treasure, non-action cards.

pub const COPPER: &str = "Copper";
pub const SILVER: &str = "Silver";
pub const GOLD: &str = "Gold";
pub const ESTATE: &str = "Estate";
pub const DUCHY: &str = "Duchy";
pub const PROVINCE: &str = "Province";
pub const CURSE: &str = "Curse";
pub const VILLAGE: &str = "Village";
pub const FESTIVAL: &str = "Festival";
pub const MARKET: &str = "Market";
pub const LABORATORY: &str = "Laboratory";
pub const SMITHY: &str = "Smithy";
pub const MOAT: &str = "Moat";
pub const MILITIA: &str = "Militia";
pub const MINE: &str = "Mine";

/// Discard weight of cards the catalog does not special-case.
pub const DEFAULT_DISCARD_WEIGHT: u32 = 1;

/// Number of copies of each card in a fresh deck.
pub const STARTING_COPPERS: usize = 7;
pub const STARTING_ESTATES: usize = 3;

/// How an action card is sequenced during the action phase.
///
/// Variants are ordered by play priority: cards that leave actions behind are
/// played before terminals, and upgrades (which need a sub-choice) go last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// Grants at least one extra action.
    NonTerminal,
    /// Consumes the last action.
    Terminal,
    /// Trashes a treasure from hand to gain a better one.
    Upgrade,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Treasure,
    Victory,
    Curse,
    Action(Action),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardInfo {
    pub name: &'static str,
    pub kind: Kind,
    /// Treasure produced when played (0 for non-treasures).
    pub value: u32,
    /// Lower weights are discarded first under a forced discard.
    pub discard_weight: u32,
}

const CATALOG: &[CardInfo] = &[
    CardInfo {
        name: COPPER,
        kind: Kind::Treasure,
        value: 1,
        discard_weight: 1,
    },
    CardInfo {
        name: SILVER,
        kind: Kind::Treasure,
        value: 2,
        discard_weight: 2,
    },
    CardInfo {
        name: GOLD,
        kind: Kind::Treasure,
        value: 3,
        discard_weight: 3,
    },
    CardInfo {
        name: ESTATE,
        kind: Kind::Victory,
        value: 0,
        discard_weight: 0,
    },
    CardInfo {
        name: DUCHY,
        kind: Kind::Victory,
        value: 0,
        discard_weight: 0,
    },
    CardInfo {
        name: PROVINCE,
        kind: Kind::Victory,
        value: 0,
        discard_weight: 0,
    },
    CardInfo {
        name: CURSE,
        kind: Kind::Curse,
        value: 0,
        discard_weight: 0,
    },
    CardInfo {
        name: VILLAGE,
        kind: Kind::Action(Action::NonTerminal),
        value: 0,
        discard_weight: DEFAULT_DISCARD_WEIGHT,
    },
    CardInfo {
        name: FESTIVAL,
        kind: Kind::Action(Action::NonTerminal),
        value: 0,
        discard_weight: DEFAULT_DISCARD_WEIGHT,
    },
    CardInfo {
        name: MARKET,
        kind: Kind::Action(Action::NonTerminal),
        value: 0,
        discard_weight: DEFAULT_DISCARD_WEIGHT,
    },
    CardInfo {
        name: LABORATORY,
        kind: Kind::Action(Action::NonTerminal),
        value: 0,
        discard_weight: DEFAULT_DISCARD_WEIGHT,
    },
    CardInfo {
        name: SMITHY,
        kind: Kind::Action(Action::Terminal),
        value: 0,
        discard_weight: DEFAULT_DISCARD_WEIGHT,
    },
    CardInfo {
        name: MOAT,
        kind: Kind::Action(Action::Terminal),
        value: 0,
        discard_weight: DEFAULT_DISCARD_WEIGHT,
    },
    CardInfo {
        name: MILITIA,
        kind: Kind::Action(Action::Terminal),
        value: 0,
        discard_weight: DEFAULT_DISCARD_WEIGHT,
    },
    CardInfo {
        name: MINE,
        kind: Kind::Action(Action::Upgrade),
        value: 0,
        discard_weight: DEFAULT_DISCARD_WEIGHT,
    },
];

/// Treasure upgrades available to [Action::Upgrade] cards.
const UPGRADES: &[(&str, &str)] = &[(COPPER, SILVER), (SILVER, GOLD)];

pub fn lookup(card: &str) -> Option<&'static CardInfo> {
    CATALOG.iter().find(|info| info.name == card)
}

/// Treasure value of a card (0 for anything that is not a treasure).
pub fn value_of(card: &str) -> u32 {
    lookup(card).map_or(0, |info| info.value)
}

pub fn discard_weight(card: &str) -> u32 {
    lookup(card).map_or(DEFAULT_DISCARD_WEIGHT, |info| info.discard_weight)
}

pub fn is_treasure(card: &str) -> bool {
    matches!(lookup(card), Some(CardInfo { kind: Kind::Treasure, .. }))
}

pub fn action_of(card: &str) -> Option<Action> {
    match lookup(card)?.kind {
        Kind::Action(action) => Some(action),
        _ => None,
    }
}

pub fn is_playable_action(card: &str) -> bool {
    action_of(card).is_some()
}

/// The treasure gained when upgrading `card`, if it can be upgraded.
pub fn upgrade_of(card: &str) -> Option<&'static str> {
    UPGRADES
        .iter()
        .find(|(from, _)| *from == card)
        .map(|(_, to)| *to)
}

/// The deck every player starts a match with.
pub fn starting_deck() -> Vec<String> {
    let mut deck = vec![COPPER.to_string(); STARTING_COPPERS];
    deck.resize(STARTING_COPPERS + STARTING_ESTATES, ESTATE.to_string());
    deck
}
