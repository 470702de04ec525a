use crate::{channel::Channel, state::GameState, Error, Result};
use doninai_client::Transport;
use doninai_types::{
    api::{AttackParams, AttackReply, Message},
    catalog::{self, MILITIA},
    Method,
};
use tracing::{info, warn};

/// Interrupts the bot knows how to answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attack {
    /// Discard `count` cards when holding more than `threshold`.
    ///
    /// Hands are dealt five cards, so two discards bring them down to three.
    ForcedDiscard { threshold: usize, count: usize },
}

impl Attack {
    /// Identify an attack by the card that triggered it.
    pub fn from_card(card: &str) -> Option<Self> {
        match card {
            MILITIA => Some(Attack::ForcedDiscard {
                threshold: 3,
                count: 2,
            }),
            _ => None,
        }
    }

    /// Resolve against the state, returning the cards to report.
    pub fn resolve(&self, state: &mut GameState) -> Vec<String> {
        match *self {
            Attack::ForcedDiscard { threshold, count } => {
                if state.hand.len() <= threshold {
                    return Vec::new();
                }
                let (kept, discarded) = lowest_weighted(&state.hand, count);
                state.hand = kept;
                discarded
            }
        }
    }
}

/// Split `hand` into (kept, discarded) where `discarded` holds the `count`
/// lowest-weighted cards. Ties go to the earlier card; `kept` preserves the
/// original order.
pub fn lowest_weighted(hand: &[String], count: usize) -> (Vec<String>, Vec<String>) {
    let mut order: Vec<usize> = (0..hand.len()).collect();
    order.sort_by_key(|&index| catalog::discard_weight(&hand[index]));
    let chosen = &order[..count.min(order.len())];

    let discarded = chosen.iter().map(|&index| hand[index].clone()).collect();
    let kept = hand
        .iter()
        .enumerate()
        .filter(|(index, _)| !chosen.contains(index))
        .map(|(_, card)| card.clone())
        .collect();
    (kept, discarded)
}

/// Answer an `Attack` request, merging any state it carries first.
pub async fn respond<T: Transport>(
    channel: &mut Channel<T>,
    state: &mut GameState,
    msg: &Message,
) -> Result<()> {
    let id = msg.id.as_ref().ok_or(Error::MissingId(Method::Attack))?;
    let params: AttackParams = msg.params().map_err(|source| Error::InvalidParams {
        method: Method::Attack,
        source,
    })?;
    let Some(attack) = Attack::from_card(&params.attack) else {
        warn!(attack = %params.attack, "Unhandled attack");
        return Err(Error::UnhandledAttack(params.attack));
    };
    state.apply(params.state);

    let discarded = attack.resolve(state);
    info!(attack = %params.attack, ?discarded, hand = ?state.hand, "Attacked");
    channel.reply(id, AttackReply { data: discarded }).await
}
