use crate::{Error, Result};
use url::Url;

/// Name the server knows a player by.
pub fn player_name(player: u32) -> String {
    format!("player{player}")
}

/// Derive the game socket URL from the HTTP endpoint handed out by the server.
///
/// Any query already on the endpoint (usually a default `?name=`) is replaced
/// by the player's own name.
pub fn websocket_url(endpoint: &str, player: u32) -> Result<Url> {
    let mut url = Url::parse(endpoint.trim())?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(Error::InvalidScheme(other.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::InvalidScheme(url.scheme().to_string()))?;
    url.set_fragment(None);
    url.set_query(None);
    url.query_pairs_mut()
        .append_pair("name", &player_name(player));
    Ok(url)
}
