use crate::{
    attack,
    channel::Channel,
    state::GameState,
    strategy::Strategy,
    turn::{self, Turn},
    Error, Result,
};
use doninai_client::{player_name, Transport};
use doninai_types::{
    api::{GameOverParams, Message, RematchReply, StatePatch},
    Method,
};
use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeMap, fmt};
use tracing::{debug, info, warn};

/// Result of one completed match, from our point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
}

impl Outcome {
    /// Compare our score against the best opponent.
    ///
    /// A table without our own entry counts as a loss; a table without
    /// opponents counts as a win.
    pub fn from_scores(us: &str, scores: &BTreeMap<String, i64>) -> Self {
        let Some(ours) = scores.get(us) else {
            warn!(player = us, ?scores, "Own score missing");
            return Outcome::Loss;
        };
        let best_opponent = scores
            .iter()
            .filter(|(name, _)| name.as_str() != us)
            .map(|(_, score)| *score)
            .max();
        match best_opponent.map(|best| ours.cmp(&best)) {
            None | Some(Ordering::Greater) => Outcome::Win,
            Some(Ordering::Equal) => Outcome::Tie,
            Some(Ordering::Less) => Outcome::Loss,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Tie => "tie",
        })
    }
}

/// Tally of outcomes across every round of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
}

impl Record {
    pub fn tally(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Tie => self.ties += 1,
        }
    }

    pub fn played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

/// Top-level dispatcher for one connection.
///
/// Owns the live [GameState] and hands it to a [Turn] on every `StartTurn`.
/// Runs until the last round's `GameOver` (or the first fatal error).
pub struct Session<T> {
    channel: Channel<T>,
    player: u32,
    strategy: Strategy,
    rounds: u32,
    state: GameState,
    turns: u32,
    record: Record,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, player: u32, strategy: Strategy, rounds: u32) -> Self {
        Self {
            channel: Channel::new(transport),
            player,
            strategy,
            rounds,
            state: GameState::new(),
            turns: 0,
            record: Record::default(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn record(&self) -> Record {
        self.record
    }

    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    /// Process inbound messages until the session ends.
    pub async fn run(&mut self) -> Result<Record> {
        info!(player = self.player, strategy = %self.strategy, rounds = self.rounds, "Session started");
        let mut pending = None;
        loop {
            let mut msg = match pending.take() {
                Some(msg) => msg,
                None => self.channel.receive().await?,
            };
            if let Some(error) = msg.error.take() {
                return Err(Error::Protocol {
                    method: msg.method.unwrap_or_else(|| "unsolicited".to_string()),
                    code: error.code,
                    message: error.message,
                });
            }
            match msg.known_method() {
                Some(Method::StartGame) => self.start_game(&msg).await?,
                Some(Method::StartTurn) => pending = self.start_turn(&msg).await?,
                Some(Method::Attack) => {
                    attack::respond(&mut self.channel, &mut self.state, &msg).await?
                }
                Some(Method::FatalError) => return Err(turn::fatal(&msg)),
                Some(Method::GameOver) => {
                    if self.game_over(&msg).await? {
                        self.channel.close().await?;
                        info!(record = ?self.record, "Session finished");
                        return Ok(self.record);
                    }
                }
                _ => match msg.method {
                    Some(method) => info!(%method, "Unhandled method"),
                    None => debug!(id = ?msg.id, "Ignoring message without method"),
                },
            }
        }
    }

    async fn start_game(&mut self, msg: &Message) -> Result<()> {
        let id = msg.id.as_ref().ok_or(Error::MissingId(Method::StartGame))?;
        self.state = GameState::new();
        self.turns = 0;
        info!(round = self.record.played() + 1, "Game started");
        self.channel.reply(id, serde_json::Map::new()).await
    }

    /// Play a turn, returning any request that arrived in place of a reply.
    async fn start_turn(&mut self, msg: &Message) -> Result<Option<Message>> {
        let patch: StatePatch = msg.params().map_err(|source| Error::InvalidParams {
            method: Method::StartTurn,
            source,
        })?;
        self.state.begin_turn(patch);
        self.turns += 1;
        debug!(
            turn = self.turns,
            hand = ?self.state.hand,
            average_draw_value = self.state.average_draw_value(),
            "Turn started"
        );

        let played = Turn::new(&mut self.channel, &mut self.state, self.strategy)
            .play()
            .await?;
        info!(
            turn = self.turns,
            bought = ?played.bought,
            treasure = self.state.treasure,
            "Turn ended"
        );
        Ok(played.pending)
    }

    /// Tally the match and answer the rematch question. Returns true once the
    /// last round is over.
    async fn game_over(&mut self, msg: &Message) -> Result<bool> {
        let id = msg.id.as_ref().ok_or(Error::MissingId(Method::GameOver))?;
        let params: GameOverParams = msg.params().map_err(|source| Error::InvalidParams {
            method: Method::GameOver,
            source,
        })?;

        let outcome = Outcome::from_scores(&player_name(self.player), &params.scores);
        self.record.tally(outcome);
        let rematch = self.record.played() < self.rounds;
        info!(
            %outcome,
            turns = self.turns,
            scores = ?params.scores,
            round = self.record.played(),
            rematch,
            "Game over"
        );

        self.channel.reply(id, RematchReply { rematch }).await?;
        if rematch {
            self.state = GameState::new();
            self.turns = 0;
        }
        Ok(!rematch)
    }
}
