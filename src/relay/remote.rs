use super::Relay;
use super::turn::{FailureBody, ReplyBody, TurnError, TurnRequest, TurnResult};
use crate::http::client::HttpClient;

/// Relay reached over HTTP, speaking the relay server's JSON contract.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    http: HttpClient,
    url: String,
}

impl HttpRelay {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Relay for HttpRelay {
    async fn relay(&self, request: &TurnRequest) -> TurnResult {
        let resp = self
            .http
            .post_json(&self.url, None, request)
            .await
            .map_err(|err| TurnError::TransportError(err.to_string()))?;

        if (200..300).contains(&resp.status) {
            let reply = serde_json::from_str::<ReplyBody>(&resp.body).map_err(|err| {
                TurnError::TransportError(format!("unexpected relay reply: {err}"))
            })?;
            return Ok(reply.response);
        }

        match serde_json::from_str::<FailureBody>(&resp.body) {
            Ok(failure) => Err(failure.into_turn_error(resp.status)),
            Err(_) => Err(TurnError::BackendError {
                status: resp.status,
                body: resp.body,
            }),
        }
    }
}
