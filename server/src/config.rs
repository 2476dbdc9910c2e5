//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist. Einige Umgebungsvariablen ueberschreiben die Datei:
//!
//! - `PORT` – `netzwerk.port`
//! - `TWILIO_ACCOUNT_SID` – `turn.account_sid`
//! - `TWILIO_AUTH_TOKEN` – `turn.auth_token`

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use videotalker_api::TurnKonfig;
use videotalker_observability::logging::{log_format_gueltig, log_level_gueltig};
use videotalker_signaling::SignalingConfig;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Signaling-Einstellungen (Keepalive, Limits)
    pub signaling: SignalingEinstellungen,
    /// TURN-Credential-Dienst
    pub turn: TurnEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer HTTP und WebSocket
    pub bind_adresse: String,
    /// Port fuer HTTP und WebSocket
    pub port: u16,
    /// Erlaubte CORS-Origins (leer = alle erlaubt)
    pub cors_origins: Vec<String>,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 5000,
            cors_origins: vec![],
        }
    }
}

/// Signaling-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingEinstellungen {
    /// Intervall fuer WebSocket-Pings in Sekunden
    pub keepalive_sek: u64,
    /// Verbindung wird getrennt wenn so lange kein Frame kam
    pub verbindungs_timeout_sek: u64,
    /// Maximale gleichzeitige Verbindungen
    pub max_verbindungen: usize,
}

impl Default for SignalingEinstellungen {
    fn default() -> Self {
        let standard = SignalingConfig::default();
        Self {
            keepalive_sek: standard.keepalive_sek,
            verbindungs_timeout_sek: standard.verbindungs_timeout_sek,
            max_verbindungen: standard.max_verbindungen,
        }
    }
}

/// TURN-Credential-Dienst
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnEinstellungen {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    /// Basis-URL der Twilio REST-API
    pub api_basis_url: String,
}

impl Default for TurnEinstellungen {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            api_basis_url: TurnKonfig::default().api_basis_url,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei und wendet die
    /// Umgebungsvariablen an.
    /// Verwendet die Standardkonfiguration wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .with_context(|| format!("Konfigurationsfehler in '{pfad}'"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Konfigurationsdatei '{pfad}' nicht lesbar"))
            }
        };
        config.umgebung_anwenden(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Ueberschreibt Werte aus der Umgebung
    ///
    /// `lookup` liefert den Wert einer Variable (leer zaehlt als nicht gesetzt).
    pub fn umgebung_anwenden(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        let wert = |name: &str| lookup(name).filter(|w| !w.trim().is_empty());

        if let Some(port) = wert("PORT") {
            self.netzwerk.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT ist keine gueltige Portnummer: '{port}'"))?;
        }
        if let Some(sid) = wert("TWILIO_ACCOUNT_SID") {
            self.turn.account_sid = Some(sid);
        }
        if let Some(token) = wert("TWILIO_AUTH_TOKEN") {
            self.turn.auth_token = Some(token);
        }
        Ok(())
    }

    /// Prueft die Konfiguration auf widerspruechliche Werte
    pub fn validieren(&self) -> anyhow::Result<()> {
        if self.signaling.keepalive_sek == 0 {
            bail!("signaling.keepalive_sek muss groesser als 0 sein");
        }
        if self.signaling.verbindungs_timeout_sek <= self.signaling.keepalive_sek {
            bail!(
                "signaling.verbindungs_timeout_sek ({}) muss groesser als keepalive_sek ({}) sein",
                self.signaling.verbindungs_timeout_sek,
                self.signaling.keepalive_sek
            );
        }
        if self.signaling.max_verbindungen == 0 {
            bail!("signaling.max_verbindungen muss groesser als 0 sein");
        }
        if !log_level_gueltig(&self.logging.level) {
            bail!("Unbekanntes Log-Level: '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Unbekanntes Log-Format: '{}'", self.logging.format);
        }
        Ok(())
    }

    /// Gibt die vollstaendige Bind-Adresse zurueck
    pub fn bind_adresse(&self) -> String {
        format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port)
    }

    /// Signaling-Konfiguration fuer den Relay
    pub fn signaling_config(&self) -> SignalingConfig {
        SignalingConfig {
            keepalive_sek: self.signaling.keepalive_sek,
            verbindungs_timeout_sek: self.signaling.verbindungs_timeout_sek,
            max_verbindungen: self.signaling.max_verbindungen,
        }
    }

    /// Zugangsdaten fuer den TURN-Credential-Dienst
    pub fn turn_konfig(&self) -> TurnKonfig {
        TurnKonfig {
            account_sid: self.turn.account_sid.clone(),
            auth_token: self.turn.auth_token.clone(),
            api_basis_url: self.turn.api_basis_url.clone(),
        }
    }
}
