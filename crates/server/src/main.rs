//! Voice bridge server entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use voicebridge_call::{CallManager, CallManagerConfig};
use voicebridge_config::Settings;
use voicebridge_server::{create_router, AppState};
use voicebridge_speech::{SttClient, TtsClient};
use voicebridge_telephony::TelephonyClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first; missing values are fatal
    let settings = voicebridge_config::load()?;
    init_tracing(&settings);

    tracing::info!("starting voicebridge v{}", env!("CARGO_PKG_VERSION"));

    let dialer = Arc::new(TelephonyClient::new(
        settings.telephony.base_url.clone(),
        settings.telephony.account_sid.clone(),
        settings.telephony.auth_token.clone(),
    ));
    let tts = Arc::new(TtsClient::new(
        settings.speech.base_url.clone(),
        settings.speech.api_key.clone(),
    ));
    let stt = Arc::new(SttClient::new(
        settings.speech.base_url.clone(),
        settings.speech.api_key.clone(),
    ));

    let public_url = settings.server.public_url.trim_end_matches('/').to_string();
    let manager = Arc::new(CallManager::new(
        CallManagerConfig {
            to_number: settings.telephony.to_number.clone(),
            from_number: settings.telephony.from_number.clone(),
            control_url: format!("{public_url}/twiml"),
            voice: settings.speech.voice.clone(),
            speed: settings.speech.speed,
            dial_timeout_seconds: settings.telephony.dial_timeout_seconds,
        },
        dialer,
        tts,
        stt,
    ));

    let state = AppState::new(manager.clone(), Arc::new(settings.clone()));
    let app = create_router(state);

    let addr = SocketAddr::new(settings.server.host.parse()?, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, public_url = %public_url, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Hang up every live call before exiting
    manager.shutdown().await;
    tracing::info!("server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{},tower_http=info", settings.observability.log_level).into()
    });

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
