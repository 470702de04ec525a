//! JSON-RPC 2.0 messages exchanged with the game server.

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier. The server may use numbers or strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(u64),
    String(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(id) => write!(f, "{id}"),
            Id::String(id) => f.write_str(id),
        }
    }
}

/// Methods the bot knows how to send or handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    StartGame,
    StartTurn,
    Attack,
    GameOver,
    FatalError,
    Play,
    Buy,
    EndTurn,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::StartGame => "StartGame",
            Method::StartTurn => "StartTurn",
            Method::Attack => "Attack",
            Method::GameOver => "GameOver",
            Method::FatalError => "FatalError",
            Method::Play => "Play",
            Method::Buy => "Buy",
            Method::EndTurn => "EndTurn",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "StartGame" => Method::StartGame,
            "StartTurn" => Method::StartTurn,
            "Attack" => Method::Attack,
            "GameOver" => Method::GameOver,
            "FatalError" => Method::FatalError,
            "Play" => Method::Play,
            "Buy" => Method::Buy,
            "EndTurn" => Method::EndTurn,
            _ => return None,
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Any frame received from the server.
///
/// Requests and notifications carry a `method`; replies to our own requests
/// carry `result` or `error` instead.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// `Some(Value::Null)` for an explicit `"result": null` acknowledgement.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Keep a present `null` as `Some(Value::Null)`; only an absent field is `None`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Message {
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// The method, if it is one the bot recognizes.
    pub fn known_method(&self) -> Option<Method> {
        self.method.as_deref().and_then(Method::from_name)
    }

    /// A reply to one of our requests: no `method`, and a `result` (possibly
    /// `null`) or an `error`.
    pub fn is_response(&self) -> bool {
        self.method.is_none() && (self.result.is_some() || self.error.is_some())
    }

    /// Decode `params`, treating an absent value as an empty object.
    pub fn params<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        let params = self
            .params
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        T::deserialize(params)
    }

    /// Decode `result`, treating an absent value as `null`.
    pub fn result<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(self.result.clone().unwrap_or(Value::Null))
    }
}

/// Extra data attached to a `Play` request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<String>,
}

impl PlayData {
    pub fn upgrade(trash: &str, gain: &str) -> Self {
        Self {
            trash: Some(trash.to_string()),
            gain: Some(gain.to_string()),
        }
    }
}

/// Requests issued by the bot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Play { card: String, data: PlayData },
    Buy { card: String },
    EndTurn,
}

impl Call {
    pub fn play(card: &str) -> Self {
        Call::Play {
            card: card.to_string(),
            data: PlayData::default(),
        }
    }

    pub fn buy(card: &str) -> Self {
        Call::Buy {
            card: card.to_string(),
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Call::Play { .. } => Method::Play,
            Call::Buy { .. } => Method::Buy,
            Call::EndTurn => Method::EndTurn,
        }
    }

    pub fn card(&self) -> Option<&str> {
        match self {
            Call::Play { card, .. } | Call::Buy { card } => Some(card),
            Call::EndTurn => None,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum CallParams<'a> {
    Play { card: &'a str, data: &'a PlayData },
    Buy { card: &'a str },
}

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<CallParams<'a>>,
}

impl Call {
    /// Encode as a JSON-RPC request with the given id.
    pub fn encode(&self, id: u64) -> serde_json::Result<String> {
        let params = match self {
            Call::Play { card, data } => Some(CallParams::Play { card, data }),
            Call::Buy { card } => Some(CallParams::Buy { card }),
            Call::EndTurn => None,
        };
        let request = Request {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: self.method().as_str(),
            params,
        };
        serde_json::to_string(&request)
    }
}

/// Reply to a request initiated by the server.
#[derive(Debug, Serialize)]
pub struct Reply<'a, R: Serialize> {
    jsonrpc: &'static str,
    id: &'a Id,
    result: R,
}

impl<'a, R: Serialize> Reply<'a, R> {
    pub fn new(id: &'a Id, result: R) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Partial game state pushed by the server.
///
/// Every field is optional: absent fields leave the local value untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discard_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply: Option<BTreeMap<String, u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buys: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treasure: Option<u32>,
}

impl StatePatch {
    /// Decode a patch from an arbitrary result payload.
    ///
    /// Payloads that are not objects (`null`, `{}` acknowledgements, strings)
    /// produce an empty patch.
    pub fn from_value(value: Option<&Value>) -> serde_json::Result<Self> {
        match value {
            Some(value @ Value::Object(_)) => Self::deserialize(value),
            _ => Ok(Self::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackParams {
    /// The card that triggered the attack.
    pub attack: String,
    #[serde(flatten)]
    pub state: StatePatch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReply {
    pub data: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverParams {
    #[serde(default)]
    pub scores: BTreeMap<String, i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RematchReply {
    pub rematch: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatalErrorParams {
    #[serde(default)]
    pub message: Option<String>,
}
