//! Authenticated session against the Growatt server.
//!
//! Holds the cookie-carrying HTTP client and the login state. Every response
//! the portal sends is wrapped in an envelope `{"back": {"success": ..}}`;
//! the envelope check lives here so all callers share it.

use super::password::hash_password;
use super::provider::PortalError;
use crate::config::{Credentials, PortalSettings};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One server session, owned by a single portal. Not shared between syncs.
pub struct AuthSession {
    client: Client,
    base_url: String,
    logged_in: bool,
}

impl AuthSession {
    pub fn new(settings: &PortalSettings) -> Result<Self, PortalError> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PortalError::Connection(format!("failed to build HTTP client: {e}")))?;

        let mut base_url = settings.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            logged_in: false,
        })
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn url(&self, page: &str) -> String {
        format!("{}{page}", self.base_url)
    }

    /// Post the credentials. The session cookie is kept by the client.
    pub fn login(&mut self, credentials: &Credentials) -> Result<(), PortalError> {
        let digest = hash_password(&credentials.password);
        let request = self.client.post(self.url("LoginAPI.do")).form(&[
            ("userName", credentials.username.as_str()),
            ("password", digest.as_str()),
        ]);

        match send_enveloped(request) {
            Ok(_) => {
                self.logged_in = true;
                info!(user = %credentials.username, "logged in");
                Ok(())
            }
            Err(PortalError::Api(reason)) => Err(PortalError::Auth(reason)),
            Err(e) => Err(e),
        }
    }

    /// End the session. Failures are logged and otherwise ignored.
    pub fn logout(&mut self) {
        if !self.logged_in {
            return;
        }
        self.logged_in = false;
        match self.client.get(self.url("logout.do")).send() {
            Ok(resp) => debug!(status = %resp.status(), "logged out"),
            Err(e) => warn!(error = %e, "logout request failed"),
        }
    }

    /// GET a page and unwrap its envelope, returning the `back` object.
    pub fn get_enveloped(&self, page: &str, query: &[(&str, String)]) -> Result<Value, PortalError> {
        debug!(page, ?query, "GET");
        let mut request = self.client.get(self.url(page));
        if !query.is_empty() {
            request = request.query(query);
        }
        send_enveloped(request)
    }

    /// POST a form and return the raw JSON body (no envelope).
    pub fn post_raw(
        &self,
        page: &str,
        query: &[(&str, &str)],
        form: &[(&str, &str)],
    ) -> Result<Value, PortalError> {
        debug!(page, ?query, "POST");
        let resp = self
            .client
            .post(self.url(page))
            .query(query)
            .form(form)
            .send()
            .map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PortalError::Api(format!("HTTP {status} for {page}")));
        }
        resp.json()
            .map_err(|e| PortalError::Api(format!("malformed JSON from {page}: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> PortalError {
    PortalError::Connection(e.to_string())
}

/// Send a request and check the response envelope.
///
/// Non-2xx status fails without looking at the body.
fn send_enveloped(request: RequestBuilder) -> Result<Value, PortalError> {
    let resp = request.send().map_err(transport_error)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(PortalError::Api(format!("request failed: HTTP {status}")));
    }
    let body: Value = resp
        .json()
        .map_err(|e| PortalError::Api(format!("malformed JSON: {e}")))?;
    unwrap_envelope(body)
}

/// Return the `back` object if its `success` flag is truthy.
pub(crate) fn unwrap_envelope(body: Value) -> Result<Value, PortalError> {
    let Value::Object(mut fields) = body else {
        return Err(PortalError::Api("response is not a JSON object".into()));
    };
    let back = fields
        .remove("back")
        .ok_or_else(|| PortalError::Api("response has no 'back' object".into()))?;
    if back.get("success").is_some_and(is_truthy) {
        Ok(back)
    } else {
        let msg = back
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("success flag not set");
        Err(PortalError::Api(msg.to_string()))
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_success() {
        let back = unwrap_envelope(json!({"back": {"success": true, "data": []}})).unwrap();
        assert_eq!(back["data"], json!([]));
    }

    #[test]
    fn envelope_falsy_flag() {
        for flag in [json!(false), json!(0), json!(""), json!(null)] {
            let r = unwrap_envelope(json!({"back": {"success": flag}}));
            assert!(matches!(r, Err(PortalError::Api(_))), "flag {flag} accepted");
        }
    }

    #[test]
    fn envelope_missing_back() {
        assert!(unwrap_envelope(json!({"success": true})).is_err());
        assert!(unwrap_envelope(json!([1, 2])).is_err());
    }

    #[test]
    fn envelope_missing_success() {
        let r = unwrap_envelope(json!({"back": {"msg": "501"}}));
        assert_eq!(r, Err(PortalError::Api("501".into())));
    }
}
