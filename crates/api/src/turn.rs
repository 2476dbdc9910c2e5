//! TURN-Credentials vom externen Dienst
//!
//! Der Token wird unveraendert durchgereicht. Weder Relay noch API werten
//! seinen Inhalt aus.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Quelle fuer kurzlebige TURN-Credentials
#[async_trait]
pub trait TurnCredentialProvider: Send + Sync + 'static {
    /// Fordert einen neuen Token an
    async fn token_erstellen(&self) -> ApiResult<Value>;
}

/// Zugangsdaten fuer den Twilio-Token-Dienst
#[derive(Debug, Clone)]
pub struct TurnKonfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub api_basis_url: String,
}

impl Default for TurnKonfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            api_basis_url: "https://api.twilio.com".to_string(),
        }
    }
}

impl TurnKonfig {
    /// Endpunkt fuer neue Tokens des Accounts
    pub fn token_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Tokens.json",
            self.api_basis_url.trim_end_matches('/'),
            account_sid
        )
    }
}

/// TURN-Credentials ueber die Twilio REST-API
pub struct TwilioProvider {
    client: reqwest::Client,
    konfig: TurnKonfig,
}

impl TwilioProvider {
    pub fn neu(konfig: TurnKonfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            konfig,
        }
    }

    /// true wenn Account-SID und Auth-Token gesetzt sind
    pub fn ist_konfiguriert(&self) -> bool {
        self.konfig.account_sid.is_some() && self.konfig.auth_token.is_some()
    }
}

#[async_trait]
impl TurnCredentialProvider for TwilioProvider {
    async fn token_erstellen(&self) -> ApiResult<Value> {
        let (Some(sid), Some(auth_token)) = (&self.konfig.account_sid, &self.konfig.auth_token)
        else {
            return Err(ApiError::NichtKonfiguriert(
                "account_sid und auth_token muessen gesetzt sein".into(),
            ));
        };

        let response = self
            .client
            .post(self.konfig.token_url(sid))
            .basic_auth(sid, Some(auth_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::DienstFehler {
                status: status.as_u16(),
            });
        }

        let token = response.json::<Value>().await?;
        tracing::debug!("TURN-Token erstellt");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_aufbau() {
        let konfig = TurnKonfig::default();
        assert_eq!(
            konfig.token_url("AC123"),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Tokens.json"
        );
    }

    #[test]
    fn token_url_ohne_doppelten_slash() {
        let konfig = TurnKonfig {
            api_basis_url: "http://localhost:8080/".into(),
            ..Default::default()
        };
        assert_eq!(
            konfig.token_url("AC1"),
            "http://localhost:8080/2010-04-01/Accounts/AC1/Tokens.json"
        );
    }

    #[tokio::test]
    async fn fehlende_zugangsdaten_ohne_netzwerkzugriff() {
        let provider = TwilioProvider::neu(TurnKonfig {
            account_sid: Some("AC123".into()),
            ..Default::default()
        });
        assert!(!provider.ist_konfiguriert());

        let fehler = provider.token_erstellen().await.unwrap_err();
        assert!(matches!(fehler, ApiError::NichtKonfiguriert(_)));
    }
}
