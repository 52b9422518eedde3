//! Twirp transport for the LiveKit control plane
//!
//! Each service method is a `POST /twirp/livekit.<Service>/<Method>` with a
//! JSON body. Failures come back as `{"code": "...", "msg": "..."}`.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::UpstreamError;
use crate::token::{AccessTokenIssuer, VideoGrants};
use crate::{Error, Result};

/// Twirp error body
#[derive(Debug, Deserialize)]
struct TwirpErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    msg: String,
}

/// Shared HTTP client for all control-plane services
#[derive(Debug, Clone)]
pub struct TwirpClient {
    http: reqwest::Client,
    base_url: String,
    issuer: Arc<AccessTokenIssuer>,
}

impl TwirpClient {
    /// Create a client; `timeout` bounds every call end to end
    pub fn new(base_url: &str, issuer: Arc<AccessTokenIssuer>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            issuer,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a service method
    pub fn endpoint(&self, service: &str, method: &str) -> String {
        format!("{}/twirp/livekit.{}/{}", self.base_url, service, method)
    }

    /// Invoke one method with a service token carrying `grants`
    pub async fn call<Req, Resp>(
        &self,
        service: &'static str,
        method: &'static str,
        request: &Req,
        grants: VideoGrants,
    ) -> std::result::Result<Resp, UpstreamError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let token = self.issuer.issue_service_token(grants)?;
        let url = self.endpoint(service, method);
        debug!(%url, "calling control plane");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(method, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<TwirpErrorBody>(&body).unwrap_or(TwirpErrorBody {
                code: "unknown".to_string(),
                msg: body,
            });
            return Err(UpstreamError::Twirp {
                method,
                status: status.as_u16(),
                code: error.code,
                msg: error.msg,
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| UpstreamError::from_reqwest(method, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::DEFAULT_TOKEN_TTL;

    #[test]
    fn test_endpoint_layout() {
        let issuer = Arc::new(AccessTokenIssuer::new("devkey", "secret", DEFAULT_TOKEN_TTL));
        let client = TwirpClient::new("http://localhost:7880/", issuer, Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:7880");
        assert_eq!(
            client.endpoint("RoomService", "CreateRoom"),
            "http://localhost:7880/twirp/livekit.RoomService/CreateRoom"
        );
    }
}
