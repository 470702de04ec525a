use crate::{attack, channel::Channel, state::GameState, strategy::Strategy, Error, Result};
use doninai_client::Transport;
use doninai_types::{
    api::{Call, FatalErrorParams, Message, PlayData, StatePatch},
    catalog::{self, Action},
    Id, Method,
};
use tracing::{debug, info, warn};

/// Phases of a single turn, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Action,
    Buy,
    EndTurn,
}

/// What a turn produced.
#[derive(Debug, Default)]
pub struct Played {
    pub bought: Vec<String>,
    /// A session-level request that arrived instead of a reply. The turn
    /// stops there and the session dispatches it next.
    pub pending: Option<Message>,
}

/// Drives one turn from `StartTurn` to the `EndTurn` request.
pub struct Turn<'a, T> {
    channel: &'a mut Channel<T>,
    state: &'a mut GameState,
    strategy: Strategy,
    phase: Phase,
    played: Played,
}

impl<'a, T: Transport> Turn<'a, T> {
    pub fn new(channel: &'a mut Channel<T>, state: &'a mut GameState, strategy: Strategy) -> Self {
        Self {
            channel,
            state,
            strategy,
            phase: Phase::Action,
            played: Played::default(),
        }
    }

    /// Run every phase.
    pub async fn play(mut self) -> Result<Played> {
        if self.action_phase().await? {
            self.phase = Phase::Buy;
            if self.buy_phase().await? {
                self.phase = Phase::EndTurn;
                self.end_turn().await?;
            }
        }
        Ok(self.played)
    }

    /// Returns false if the turn was cut short.
    async fn action_phase(&mut self) -> Result<bool> {
        while self.state.actions >= 1 {
            let Some((card, data)) = next_action(&self.state.hand) else {
                break;
            };
            debug!(%card, actions = self.state.actions, "Play action");
            self.state.take_from_hand(&card);
            self.state.actions -= 1;
            let Some(patch) = self.call(Call::Play { card, data }).await? else {
                return Ok(false);
            };
            self.state.apply(patch);
        }
        Ok(true)
    }

    /// Returns false if the turn was cut short.
    async fn buy_phase(&mut self) -> Result<bool> {
        let treasures: Vec<String> = self
            .state
            .hand
            .iter()
            .filter(|card| catalog::is_treasure(card))
            .cloned()
            .collect();
        for card in treasures {
            self.state.take_from_hand(&card);
            self.state.treasure = self.state.treasure.saturating_add(catalog::value_of(&card));
            let Some(patch) = self.call(Call::play(&card)).await? else {
                return Ok(false);
            };
            self.state.apply(patch);
        }

        let wanted = self.strategy.decide(self.state);
        debug!(treasure = self.state.treasure, buys = self.state.buys, ?wanted, "Decided");
        for card in wanted {
            if self.state.buys == 0 {
                break;
            }
            if !self.state.in_stock(&card) {
                info!(%card, "Sold out");
                break;
            }
            self.state.buys -= 1;
            let Some(patch) = self.call(Call::buy(&card)).await? else {
                return Ok(false);
            };
            self.state.record_buy(&card);
            self.state.apply(patch);
            self.played.bought.push(card);
        }
        Ok(true)
    }

    /// Servers may or may not acknowledge `EndTurn`; a trailing result is
    /// merged, and a request arriving first is left for the session.
    async fn end_turn(&mut self) -> Result<()> {
        if let Some(patch) = self.call(Call::EndTurn).await? {
            self.state.apply(patch);
        }
        Ok(())
    }

    /// Send a request and wait for its reply.
    ///
    /// Attacks arriving in the meantime are answered inline. `StartGame`,
    /// `StartTurn` and `GameOver` end the wait with `None` and are kept in
    /// [Played::pending]. Anything else is skipped.
    async fn call(&mut self, call: Call) -> Result<Option<StatePatch>> {
        let method = call.method();
        let id = self.channel.request(&call).await?;
        loop {
            let mut msg = self.channel.receive().await?;
            if let Some(error) = msg.error.take() {
                return Err(Error::Protocol {
                    method: method.to_string(),
                    code: error.code,
                    message: error.message,
                });
            }
            if msg.is_response() {
                if msg.id != Some(Id::Number(id)) {
                    debug!(expected = id, got = ?msg.id, "Reply id mismatch");
                }
                return StatePatch::from_value(msg.result.as_ref())
                    .map(Some)
                    .map_err(|source| Error::InvalidParams { method, source });
            }
            match msg.known_method() {
                Some(Method::Attack) => {
                    debug!(phase = ?self.phase, "Attack while awaiting reply");
                    attack::respond(self.channel, self.state, &msg).await?;
                }
                Some(Method::FatalError) => return Err(fatal(&msg)),
                Some(next @ (Method::StartGame | Method::StartTurn | Method::GameOver)) => {
                    if self.phase == Phase::EndTurn {
                        debug!(%next, "No reply to EndTurn");
                    } else {
                        warn!(%next, awaiting = %method, phase = ?self.phase, "Turn cut short");
                    }
                    self.played.pending = Some(msg);
                    return Ok(None);
                }
                _ => warn!(method = ?msg.method, awaiting = %method, "Skipping message"),
            }
        }
    }
}

/// Pick the next action card to play and the data it needs.
///
/// Cards are ranked by [Action] order, earlier hand position breaking ties.
/// Upgrade cards are only eligible when the hand holds an upgradable
/// treasure, and always target the most valuable one.
pub fn next_action(hand: &[String]) -> Option<(String, PlayData)> {
    hand.iter()
        .filter_map(|card| {
            let action = catalog::action_of(card)?;
            let data = match action {
                Action::NonTerminal | Action::Terminal => PlayData::default(),
                Action::Upgrade => {
                    let (trash, gain) = best_upgrade(hand)?;
                    PlayData::upgrade(trash, gain)
                }
            };
            Some((action, card, data))
        })
        .min_by_key(|(action, _, _)| *action)
        .map(|(_, card, data)| (card.clone(), data))
}

fn best_upgrade(hand: &[String]) -> Option<(&str, &'static str)> {
    hand.iter()
        .filter_map(|card| Some((card.as_str(), catalog::upgrade_of(card)?)))
        .max_by_key(|(card, _)| catalog::value_of(card))
}

pub(crate) fn fatal(msg: &Message) -> Error {
    let params: FatalErrorParams = msg.params().unwrap_or_default();
    Error::Fatal(params.message.unwrap_or_else(|| "unspecified".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use doninai_client::mocks::ScriptedTransport;
    use doninai_types::catalog::{
        COPPER, ESTATE, GOLD, MARKET, MILITIA, MINE, PROVINCE, SILVER, SMITHY, VILLAGE,
    };
    use serde_json::{json, Value};

    fn cards(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn reply(id: u64, result: Value) -> String {
        json!({"jsonrpc": "2.0", "id": id, "result": result}).to_string()
    }

    fn state_with(hand: &[&str]) -> GameState {
        GameState {
            hand: cards(hand),
            ..GameState::new()
        }
    }

    /// (method, card) pairs of everything sent, in order.
    fn requests(channel: &Channel<ScriptedTransport>) -> Vec<(String, Option<String>)> {
        channel
            .transport()
            .sent_json()
            .iter()
            .map(|frame| {
                (
                    frame["method"].as_str().unwrap_or("").to_string(),
                    frame["params"]["card"].as_str().map(str::to_string),
                )
            })
            .collect()
    }

    fn req(method: &str, card: Option<&str>) -> (String, Option<String>) {
        (method.to_string(), card.map(str::to_string))
    }

    #[test]
    fn test_next_action_priority() {
        assert_eq!(next_action(&cards(&[COPPER, ESTATE])), None);
        assert_eq!(
            next_action(&cards(&[SMITHY, VILLAGE, MARKET])),
            Some((VILLAGE.to_string(), PlayData::default()))
        );
        assert_eq!(
            next_action(&cards(&[MINE, SILVER, MILITIA])),
            Some((MILITIA.to_string(), PlayData::default()))
        );
    }

    #[test]
    fn test_next_action_upgrade_targets_best_treasure() {
        assert_eq!(
            next_action(&cards(&[COPPER, MINE, SILVER, GOLD])),
            Some((MINE.to_string(), PlayData::upgrade(SILVER, GOLD)))
        );
        assert_eq!(
            next_action(&cards(&[MINE, COPPER, ESTATE])),
            Some((MINE.to_string(), PlayData::upgrade(COPPER, SILVER)))
        );

        // Nothing to upgrade: Mine is not eligible
        assert_eq!(next_action(&cards(&[MINE, GOLD, ESTATE])), None);
    }

    #[tokio::test]
    async fn test_turn_plays_action_treasure_buy_end() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({"hand": ["Gold"], "actions": 2})),
            reply(1, json!({"hand": [], "treasure": 3})),
            reply(2, json!({"buys": 0})),
            reply(3, json!({})),
        ]));
        let mut state = GameState::new();
        state.begin_turn(StatePatch {
            hand: Some(cards(&[GOLD, VILLAGE])),
            treasure: Some(0),
            ..Default::default()
        });

        let bought = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap()
            .bought;

        assert_eq!(bought, cards(&[SILVER]));
        assert_eq!(
            requests(&channel),
            vec![
                req("Play", Some(VILLAGE)),
                req("Play", Some(GOLD)),
                req("Buy", Some(SILVER)),
                req("EndTurn", None),
            ]
        );
        assert_eq!(channel.transport().remaining(), 0);
        assert_eq!(state.treasure, 3);
        assert_eq!(state.deck.len(), 11);
        assert!(state.deck_contains(SILVER));
    }

    #[tokio::test]
    async fn test_treasure_accumulates_without_server_totals() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({})),
            reply(1, json!({})),
            reply(2, json!({})),
            reply(3, json!({})),
            reply(4, json!({})),
        ]));
        let mut state = state_with(&[GOLD, GOLD, SILVER, ESTATE]);

        let bought = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap()
            .bought;

        assert_eq!(state.treasure, 8);
        assert_eq!(bought, cards(&[PROVINCE]));
        assert_eq!(state.hand, cards(&[ESTATE]));
        assert_eq!(
            requests(&channel),
            vec![
                req("Play", Some(GOLD)),
                req("Play", Some(GOLD)),
                req("Play", Some(SILVER)),
                req("Buy", Some(PROVINCE)),
                req("EndTurn", None),
            ]
        );
    }

    #[tokio::test]
    async fn test_action_phase_stops_when_actions_run_out() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({"hand": ["Smithy", "Copper", "Copper", "Copper", "Copper"]})),
            reply(1, json!({})),
            reply(2, json!({})),
            reply(3, json!({})),
            reply(4, json!({})),
            reply(5, json!({})),
            reply(6, json!({})),
        ]));
        let mut state = state_with(&[SMITHY, SMITHY, COPPER]);

        Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap();

        let sent = requests(&channel);
        assert_eq!(sent[0], req("Play", Some(SMITHY)));
        assert_eq!(
            sent.iter()
                .filter(|request| **request == req("Play", Some(SMITHY)))
                .count(),
            1
        );
        assert_eq!(sent[5], req("Buy", Some(SILVER)));
        assert_eq!(sent[6], req("EndTurn", None));
        assert_eq!(state.hand, cards(&[SMITHY]));
    }

    #[tokio::test]
    async fn test_mine_sends_upgrade_data() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({"hand": ["Gold", "Copper"], "actions": 0})),
            reply(1, json!({})),
            reply(2, json!({})),
            reply(3, json!({})),
            reply(4, json!({})),
        ]));
        let mut state = state_with(&[MINE, SILVER, COPPER]);

        Turn::new(&mut channel, &mut state, Strategy::Gated)
            .play()
            .await
            .unwrap();

        let sent = channel.transport().sent_json();
        assert_eq!(
            sent[0]["params"],
            json!({"card": "Mine", "data": {"trash": "Silver", "gain": "Gold"}})
        );
        assert_eq!(sent[3]["params"]["card"], "Silver");
    }

    #[tokio::test]
    async fn test_sold_out_skips_purchase() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({})),
            reply(1, json!({})),
            reply(2, json!({})),
        ]));
        let mut state = state_with(&[GOLD, GOLD]);
        state.apply(StatePatch {
            supply: Some([(GOLD.to_string(), 0), (SILVER.to_string(), 10)].into()),
            ..Default::default()
        });

        let bought = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap()
            .bought;

        assert!(bought.is_empty());
        assert_eq!(
            requests(&channel),
            vec![
                req("Play", Some(GOLD)),
                req("Play", Some(GOLD)),
                req("EndTurn", None)
            ]
        );
        assert_eq!(state.deck.len(), 10);
    }

    #[tokio::test]
    async fn test_gated_below_floor_buys_nothing() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({})),
            reply(1, json!({})),
        ]));
        let mut state = state_with(&[COPPER, ESTATE, ESTATE]);

        let bought = Turn::new(&mut channel, &mut state, Strategy::Gated)
            .play()
            .await
            .unwrap()
            .bought;

        assert!(bought.is_empty());
        assert_eq!(
            requests(&channel),
            vec![req("Play", Some(COPPER)), req("EndTurn", None)]
        );
    }

    #[tokio::test]
    async fn test_no_buys_left_skips_purchase() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({"buys": 0})),
            reply(1, json!({})),
        ]));
        let mut state = state_with(&[COPPER]);

        let bought = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap()
            .bought;

        assert!(bought.is_empty());
        assert_eq!(
            requests(&channel),
            vec![req("Play", Some(COPPER)), req("EndTurn", None)]
        );
    }

    #[tokio::test]
    async fn test_end_turn_result_is_merged() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({})),
            reply(
                1,
                json!({"hand": ["Copper", "Estate"], "discardCount": 6, "supply": {"Province": 7}}),
            ),
        ]));
        let mut state = GameState::new();

        Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap();

        assert_eq!(state.hand, cards(&[COPPER, ESTATE]));
        assert_eq!(state.discard_count, 6);
        assert_eq!(state.supply[PROVINCE], 7);
    }

    #[tokio::test]
    async fn test_attack_answered_while_awaiting_reply() {
        let mut channel = Channel::new(ScriptedTransport::new([
            json!({
                "jsonrpc": "2.0",
                "id": 99,
                "method": "Attack",
                "params": {"attack": "Militia", "hand": ["Estate", "Silver", "Estate", "Gold", "Copper"]}
            })
            .to_string(),
            reply(0, json!({})),
            reply(1, json!({})),
            reply(2, json!({})),
            reply(3, json!({})),
            reply(4, json!({})),
            reply(5, json!({})),
        ]));
        let mut state = state_with(&[VILLAGE]);

        Turn::new(&mut channel, &mut state, Strategy::Gated)
            .play()
            .await
            .unwrap();

        let sent = channel.transport().sent_json();
        assert_eq!(sent[0]["method"], "Play");
        assert_eq!(
            sent[1],
            json!({"jsonrpc": "2.0", "id": 99, "result": {"data": ["Estate", "Estate"]}})
        );

        // The turn continues with the hand the attack left behind
        let cards: Vec<_> = sent[2..]
            .iter()
            .map(|frame| frame["params"]["card"].clone())
            .collect();
        assert_eq!(
            cards,
            vec![
                json!("Silver"),
                json!("Gold"),
                json!("Copper"),
                json!("Gold"),
                Value::Null
            ]
        );
        assert_eq!(state.treasure, 6);
    }

    #[tokio::test]
    async fn test_null_results_acknowledge_requests() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, Value::Null),
            reply(1, Value::Null),
            reply(2, Value::Null),
        ]));
        let mut state = state_with(&[COPPER]);

        let played = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap();

        assert_eq!(played.bought, cards(&[COPPER]));
        assert!(played.pending.is_none());
        assert_eq!(
            requests(&channel),
            vec![
                req("Play", Some(COPPER)),
                req("Buy", Some(COPPER)),
                req("EndTurn", None)
            ]
        );
        assert_eq!(channel.transport().remaining(), 0);
    }

    #[tokio::test]
    async fn test_unacknowledged_end_turn_hands_back_request() {
        let game_over = json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "GameOver",
            "params": {"scores": {"player1": 3}}
        });
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({})),
            reply(1, json!({})),
            json!({"jsonrpc": "2.0", "method": "Chat", "params": {"text": "gg"}}).to_string(),
            game_over.to_string(),
        ]));
        let mut state = state_with(&[COPPER]);

        let played = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap();

        let pending = played.pending.unwrap();
        assert_eq!(pending.known_method(), Some(Method::GameOver));
        assert_eq!(pending.id, Some(Id::Number(7)));
        assert_eq!(played.bought, cards(&[COPPER]));
        assert_eq!(requests(&channel).last(), Some(&req("EndTurn", None)));
        assert_eq!(channel.transport().remaining(), 0);
    }

    #[tokio::test]
    async fn test_session_request_cuts_turn_short() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({})),
            json!({"jsonrpc": "2.0", "method": "StartTurn", "params": {"hand": ["Gold"]}})
                .to_string(),
        ]));
        let mut state = state_with(&[SILVER, GOLD]);

        let played = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap();

        assert_eq!(
            played.pending.and_then(|msg| msg.known_method()),
            Some(Method::StartTurn)
        );
        assert!(played.bought.is_empty());
        assert_eq!(
            requests(&channel),
            vec![req("Play", Some(SILVER)), req("Play", Some(GOLD))]
        );
    }

    #[tokio::test]
    async fn test_treasure_saturates() {
        let mut channel = Channel::new(ScriptedTransport::new([
            reply(0, json!({})),
            reply(1, json!({"buys": 0})),
            reply(2, json!({})),
        ]));
        let mut state = state_with(&[GOLD]);
        state.treasure = u32::MAX - 1;

        Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap();
        assert_eq!(state.treasure, u32::MAX);
    }

    #[tokio::test]
    async fn test_protocol_error_is_fatal() {
        let mut channel = Channel::new(ScriptedTransport::new([json!({
            "jsonrpc": "2.0",
            "id": 0,
            "error": {"code": -32602, "message": "card not in hand"}
        })
        .to_string()]));
        let mut state = state_with(&[COPPER]);

        let err = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap_err();
        let Error::Protocol {
            method,
            code,
            message,
        } = err
        else {
            panic!("expected protocol error, got {err:?}");
        };
        assert_eq!(method, "Play");
        assert_eq!(code, -32602);
        assert_eq!(message, "card not in hand");
        assert_eq!(channel.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn test_fatal_error_while_awaiting_reply() {
        let mut channel = Channel::new(ScriptedTransport::new([
            json!({"jsonrpc": "2.0", "method": "Chat", "params": {"text": "hi"}}).to_string(),
            json!({"jsonrpc": "2.0", "method": "FatalError", "params": {"message": "desync"}})
                .to_string(),
        ]));
        let mut state = GameState::new();

        let err = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fatal(ref message) if message == "desync"));
    }

    #[tokio::test]
    async fn test_connection_loss_is_fatal() {
        let mut channel = Channel::new(ScriptedTransport::default());
        let mut state = state_with(&[COPPER]);

        let err = Turn::new(&mut channel, &mut state, Strategy::Baseline)
            .play()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(doninai_client::Error::ConnectionClosed)
        ));
    }
}
