//! Identity resolution against the deployment's repository API.

use serde_json::Value;
use url::Url;

use crate::client::EngineClient;
use crate::error::{Error, Result};
use crate::http::HttpMethod;

/// The authenticated user, resolved once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub directory: String,
    pub user_id: String,
    /// Raw repository record, for consumers that need more than the ids.
    pub record: Value,
}

impl EngineClient {
    /// Resolves the authenticated identity via the repository's who-am-I
    /// endpoint, storing it on first success.
    ///
    /// Runs after [`connect`](EngineClient::connect). No retries; any
    /// failure is [`Error::Auth`] and nothing is stored.
    pub async fn authenticate(&self) -> Result<UserIdentity> {
        if let Some(identity) = self.identity.lock().clone() {
            return Ok(identity);
        }
        // Ordering guard: bootstrap -> connect -> authenticate.
        self.engine()
            .map_err(|_| Error::Auth("connect() must complete before authenticate()".to_string()))?;

        let mut url = Url::parse(&format!("{}/qrs/user/full", self.endpoints().saas_url))
            .map_err(|error| Error::Auth(format!("invalid identity url: {error}")))?;
        if let Some(ticket) = &self.config().ticket {
            url.query_pairs_mut().append_pair("qlikTicket", ticket);
        }

        let payload = self
            .fetch_api(HttpMethod::Get, url.as_str(), None)
            .await
            .map_err(|error| Error::Auth(format!("who-am-I request failed: {error}")))?;

        let identity = parse_identity(&payload)?;
        tracing::info!(
            target = "qix.auth",
            directory = %identity.directory,
            user_id = %identity.user_id,
            "authenticated"
        );
        *self.identity.lock() = Some(identity.clone());
        Ok(identity)
    }
}

/// The repository answers with an array of user records; the first one is
/// the caller.
fn parse_identity(payload: &Value) -> Result<UserIdentity> {
    let record = payload
        .as_array()
        .and_then(|records| records.first())
        .ok_or_else(|| Error::Auth("identity payload held no records".to_string()))?;

    let directory = record["userDirectory"]
        .as_str()
        .ok_or_else(|| Error::Auth("identity record missing userDirectory".to_string()))?;
    let user_id = record["userId"]
        .as_str()
        .ok_or_else(|| Error::Auth("identity record missing userId".to_string()))?;

    Ok(UserIdentity {
        directory: directory.to_string(),
        user_id: user_id.to_string(),
        record: record.clone(),
    })
}
