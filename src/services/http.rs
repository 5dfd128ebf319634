use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tokio::sync::mpsc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use super::referrals::ReferralRequest;
use crate::settings::Http;

mod referrals;

#[derive(Clone)]
pub struct AppState {
    referral_channel: mpsc::Sender<ReferralRequest>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {:?}.", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn router(
    referral_channel: mpsc::Sender<ReferralRequest>,
    allowed_origins: &[String],
) -> Router {
    let app_state = AppState { referral_channel };

    Router::new()
        .route(
            "/api/referrals",
            get(referrals::list_referrals).post(referrals::create_referral),
        )
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

pub async fn start_http_server(
    referral_channel: mpsc::Sender<ReferralRequest>,
    settings: &Http,
) -> Result<(), anyhow::Error> {
    let app = router(referral_channel, &settings.allowed_origins);

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port)).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
