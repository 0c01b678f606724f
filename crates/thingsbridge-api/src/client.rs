// Device attributes HTTP client
//
// Wraps `reqwest::Client` with the ThingsBoard device API URL scheme
// and status mapping. Holds no state beyond the endpoint; callers pick
// the per-request deadline.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::endpoint::Endpoint;
use crate::error::Error;

/// Raw body of `GET /api/v1/{token}/attributes`.
///
/// Both groups are optional on the wire; `null` is treated the same as
/// absent. Unknown top-level fields are ignored.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct AttributesResponse {
    #[serde(default)]
    pub client: Option<Map<String, Value>>,
    #[serde(default)]
    pub shared: Option<Map<String, Value>>,
}

/// HTTP client for one device's attributes endpoint.
#[derive(Debug, Clone)]
pub struct AttributesClient {
    http: reqwest::Client,
    endpoint: Endpoint,
}

impl AttributesClient {
    /// Create a client sharing an existing `reqwest::Client` (and its pool).
    pub fn with_client(http: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { http, endpoint }
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// `GET` the device's client and shared attributes.
    ///
    /// 401 maps to [`Error::Authentication`], any other non-2xx status to
    /// [`Error::Status`], and a body that is not a JSON object with
    /// object-or-null groups to [`Error::Deserialization`].
    pub async fn fetch_attributes(&self, timeout: Duration) -> Result<AttributesResponse, Error> {
        debug!(endpoint = %self.endpoint, "GET attributes");

        let resp = self
            .http
            .get(self.endpoint.attributes_url().clone())
            .timeout(timeout)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "invalid access token".into(),
            });
        }
        if !status.is_success() {
            return Err(status_error(status, resp).await);
        }

        let body = resp.text().await?;
        trace!(bytes = body.len(), "attributes body received");

        parse_attributes(&body)
    }

    /// `POST` a flat name→value object to the attributes endpoint.
    ///
    /// Only 200 and 201 count as success; 401 maps to
    /// [`Error::Authentication`] and every other status to [`Error::Status`].
    pub async fn post_attributes(
        &self,
        attributes: &(impl Serialize + Sync),
        timeout: Duration,
    ) -> Result<(), Error> {
        debug!(endpoint = %self.endpoint, "POST attributes");

        let resp = self
            .http
            .post(self.endpoint.attributes_url().clone())
            .json(attributes)
            .timeout(timeout)
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(()),
            StatusCode::UNAUTHORIZED => Err(Error::Authentication {
                message: "invalid access token".into(),
            }),
            status => Err(status_error(status, resp).await),
        }
    }

    /// `GET` the attributes endpoint and report only the status code.
    ///
    /// Used for one-shot reachability checks; the body is not parsed.
    /// Transport failures are returned as [`Error::Transport`].
    pub async fn probe(&self, timeout: Duration) -> Result<StatusCode, Error> {
        debug!(endpoint = %self.endpoint, "probe attributes endpoint");

        let resp = self
            .http
            .get(self.endpoint.attributes_url().clone())
            .timeout(timeout)
            .send()
            .await?;
        Ok(resp.status())
    }
}

/// Decode an attributes body. Sequences are rejected up front because serde
/// would otherwise accept `[null, null]` as a positional struct.
fn parse_attributes(body: &str) -> Result<AttributesResponse, Error> {
    let deser_err = |message: String| {
        let preview = &body[..floor_char_boundary(body, 200)];
        Error::Deserialization {
            message: format!("{message} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    };

    let value: Value = serde_json::from_str(body).map_err(|e| deser_err(e.to_string()))?;
    if !value.is_object() {
        return Err(deser_err("expected a JSON object".into()));
    }
    serde_json::from_value(value).map_err(|e| deser_err(e.to_string()))
}

async fn status_error(status: StatusCode, resp: reqwest::Response) -> Error {
    let body = resp.text().await.unwrap_or_default();
    let end = floor_char_boundary(&body, 200);
    Error::Status {
        status: status.as_u16(),
        body: body[..end].to_owned(),
    }
}

/// Largest char boundary `<= max` so previews never split a UTF-8 sequence.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_boundary_respects_utf8() {
        let s = "é".repeat(150);
        let end = floor_char_boundary(&s, 200);
        assert!(s.is_char_boundary(end));
        assert!(end <= 200);
    }

    #[test]
    fn parse_accepts_missing_and_null_groups() {
        let parsed = parse_attributes(r#"{"shared": null}"#).expect("valid body");
        assert!(parsed.client.is_none());
        assert!(parsed.shared.is_none());
    }

    #[test]
    fn parse_rejects_non_object_body() {
        for body in ["[null, null]", "42", "\"text\"", r#"{"client": 5}"#, "not json"] {
            assert!(
                matches!(parse_attributes(body), Err(Error::Deserialization { .. })),
                "expected deserialization error for {body}"
            );
        }
    }
}
