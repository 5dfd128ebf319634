use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use tokio::sync::mpsc;

use crate::repositories::{mail::Mailer, referrals::ReferralStore};
use crate::settings::Settings;

pub mod http;
pub mod referrals;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("All fields are required")]
    Validation,
    #[error("Friend email is already referred")]
    Duplicate,
    #[error("Database error: {0}")]
    Persistence(String),
    #[error("Notification error: {0}")]
    Notification(String),
    #[error("Communication error: {0}")]
    Communication(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation | ServiceError::Duplicate => StatusCode::BAD_REQUEST,
            ServiceError::Persistence(_)
            | ServiceError::Notification(_)
            | ServiceError::Communication(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text returned to HTTP clients in the `error` field.
    pub fn client_message(&self) -> String {
        match self {
            ServiceError::Validation | ServiceError::Duplicate => self.to_string(),
            ServiceError::Persistence(message) => message.clone(),
            ServiceError::Notification(_) => "Failed to send referral email".to_string(),
            ServiceError::Communication(_) => "Internal server error".to_string(),
        }
    }
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(
    store: Arc<dyn ReferralStore>,
    mailer: Arc<dyn Mailer>,
    settings: Settings,
) -> Result<(), anyhow::Error> {
    let (referral_tx, mut referral_rx) = mpsc::channel(512);

    let mut referral_service = referrals::ReferralService::new();
    let sender = settings.mail.sender_address().to_string();

    log::info!("Starting referral service.");
    tokio::spawn(async move {
        referral_service
            .run(
                referrals::ReferralRequestHandler::new(store, mailer, sender),
                &mut referral_rx,
            )
            .await;
    });

    log::info!("Starting HTTP server.");
    http::start_http_server(referral_tx, &settings.http).await?;

    Ok(())
}
