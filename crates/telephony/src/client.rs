//! Outbound call placement

use async_trait::async_trait;

use crate::TelephonyError;

/// Places outbound calls with the telephony provider
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Dial `to` from `from`. On answer the provider fetches the control
    /// descriptor from `control_url` and opens the media stream it names.
    /// Returns the provider's call SID.
    async fn place_outbound(
        &self,
        to: &str,
        from: &str,
        control_url: &str,
        timeout_seconds: u32,
    ) -> Result<String, TelephonyError>;
}

/// HTTP client for the provider's call placement API
pub struct TelephonyClient {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
}

impl TelephonyClient {
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }
}

#[async_trait]
impl Dialer for TelephonyClient {
    async fn place_outbound(
        &self,
        to: &str,
        from: &str,
        control_url: &str,
        timeout_seconds: u32,
    ) -> Result<String, TelephonyError> {
        let response = self
            .http
            .post(format!(
                "{}/2010-04-01/Accounts/{}/Calls.json",
                self.base_url, self.account_sid
            ))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", to),
                ("From", from),
                ("Url", control_url),
                ("Timeout", &timeout_seconds.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        let sid = body["sid"]
            .as_str()
            .ok_or_else(|| TelephonyError::Malformed("no sid in response".to_string()))?
            .to_string();

        tracing::info!(call_sid = %sid, to, "outbound call placed");
        Ok(sid)
    }
}
