//! videotalker-server – Bibliotheks-Root
//!
//! Baut alle Subsysteme zu einem Axum-Router zusammen und stellt den
//! oeffentlichen Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use config::ServerConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use videotalker_api::{api_router, ApiState, TurnCredentialProvider, TwilioProvider};
use videotalker_observability::{
    http_metriken_middleware, observability_router, request_timing_layer, HealthState,
    VideotalkerMetrics,
};
use videotalker_signaling::{signaling_router, EventBroadcaster, SignalingState};

/// Haelt den Server-Zustand zusammen
pub struct Server {
    config: ServerConfig,
    metriken: VideotalkerMetrics,
    signaling: Arc<SignalingState<EventBroadcaster>>,
    turn: Arc<dyn TurnCredentialProvider>,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    /// Erstellt einen neuen Server mit dem Twilio-Credential-Dienst
    pub fn neu(config: ServerConfig) -> Result<Self> {
        let turn = Arc::new(TwilioProvider::neu(config.turn_konfig()));
        Self::mit_turn_provider(config, turn)
    }

    /// Erstellt einen neuen Server mit beliebigem Credential-Dienst
    pub fn mit_turn_provider(
        config: ServerConfig,
        turn: Arc<dyn TurnCredentialProvider>,
    ) -> Result<Self> {
        let metriken = VideotalkerMetrics::neu()?;
        let signaling = SignalingState::neu(
            config.signaling_config(),
            EventBroadcaster::neu(),
            metriken.clone(),
        );
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            metriken,
            signaling,
            turn,
            shutdown_tx,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Vollstaendiger Router: API, Signaling, Health und Metriken
    pub fn router(&self) -> Router {
        let health = HealthState::neu(
            self.metriken.clone(),
            self.config.signaling.max_verbindungen,
        );

        Router::new()
            .merge(api_router(ApiState::neu(Arc::clone(&self.turn))))
            .merge(signaling_router(
                Arc::clone(&self.signaling),
                self.shutdown_tx.subscribe(),
            ))
            .merge(observability_router(self.metriken.clone(), health))
            .layer(middleware::from_fn_with_state(
                self.metriken.clone(),
                http_metriken_middleware,
            ))
            .layer(request_timing_layer())
            .layer(self.cors())
    }

    /// CORS: entweder spezifische Origins oder Any
    fn cors(&self) -> CorsLayer {
        let origins = &self.config.netzwerk.cors_origins;
        if origins.is_empty() {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
    }

    /// Bindet die konfigurierte Adresse und laeuft bis Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_adresse()).await?;
        self.starten_mit(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(fehler = %e, "Ctrl-C-Handler konnte nicht installiert werden");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Laeuft auf dem gegebenen Listener bis `shutdown` fertig ist
    ///
    /// Beim Shutdown erhalten alle Verbindungs-Tasks das Signal, schliessen
    /// ihren Socket und bereinigen die Registry.
    pub async fn starten_mit(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let adresse = listener.local_addr()?;
        let app = self.router();
        let shutdown_tx = self.shutdown_tx;

        tracing::info!(
            adresse = %adresse,
            max_verbindungen = self.config.signaling.max_verbindungen,
            turn_konfiguriert = self.config.turn.account_sid.is_some(),
            "Server gestartet"
        );

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown-Signal empfangen, Verbindungen werden getrennt");
            let _ = shutdown_tx.send(true);
        })
        .await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}
