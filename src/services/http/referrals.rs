use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::models::referrals::NewReferral;
use crate::services::{referrals::ReferralRequest, ServiceError};

fn error_response(e: ServiceError) -> (StatusCode, Json<serde_json::Value>) {
    (e.status_code(), Json(json!({ "error": e.client_message() })))
}

pub async fn create_referral(
    State(state): State<super::AppState>,
    payload: Result<Json<NewReferral>, JsonRejection>,
) -> impl IntoResponse {
    let referral = match payload {
        Ok(Json(referral)) => referral,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
        }
    };

    let (referral_tx, referral_rx) = oneshot::channel();

    let send_result = state
        .referral_channel
        .send(ReferralRequest::Submit {
            referral,
            response: referral_tx,
        })
        .await;
    if let Err(e) = send_result {
        return error_response(ServiceError::Communication(e.to_string()));
    }

    match referral_rx.await {
        Ok(Ok(referral)) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Referral saved & email sent!",
                "referral": referral
            })),
        ),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => error_response(ServiceError::Communication(e.to_string())),
    }
}

pub async fn list_referrals(State(state): State<super::AppState>) -> impl IntoResponse {
    let (referral_tx, referral_rx) = oneshot::channel();

    let send_result = state
        .referral_channel
        .send(ReferralRequest::List {
            response: referral_tx,
        })
        .await;
    if let Err(e) = send_result {
        return error_response(ServiceError::Communication(e.to_string()));
    }

    match referral_rx.await {
        Ok(Ok(referrals)) => (StatusCode::OK, Json(json!(referrals))),
        Ok(Err(service_error)) => error_response(service_error),
        Err(e) => error_response(ServiceError::Communication(e.to_string())),
    }
}
