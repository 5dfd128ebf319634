use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{RequestHandler, Service, ServiceError};
use crate::models::referrals::{NewReferral, Referral, ValidReferral};
use crate::repositories::{
    mail::{MailMessage, Mailer},
    referrals::{ReferralStore, RepositoryError},
};

pub const REFERRAL_SUBJECT: &str = "You’ve been referred!";

pub enum ReferralRequest {
    Submit {
        referral: NewReferral,
        response: oneshot::Sender<Result<Referral, ServiceError>>,
    },
    List {
        response: oneshot::Sender<Result<Vec<Referral>, ServiceError>>,
    },
}

#[derive(Clone)]
pub struct ReferralRequestHandler {
    store: Arc<dyn ReferralStore>,
    mailer: Arc<dyn Mailer>,
    sender: String,
}

impl ReferralRequestHandler {
    pub fn new(store: Arc<dyn ReferralStore>, mailer: Arc<dyn Mailer>, sender: String) -> Self {
        ReferralRequestHandler {
            store,
            mailer,
            sender,
        }
    }

    /// Validates, stores and notifies. A failed notification is reported as an
    /// error even though the referral has already been stored.
    pub async fn submit(&self, referral: NewReferral) -> Result<Referral, ServiceError> {
        let referral = referral.validate().ok_or(ServiceError::Validation)?;

        let existing = self
            .store
            .find_by_friend_email(&referral.friend_email)
            .await
            .map_err(persistence_error)?;
        if existing.is_some() {
            log::warn!("Rejected duplicate referral.");
            log::debug!("Friend email already referred: {}", referral.friend_email);
            return Err(ServiceError::Duplicate);
        }

        let stored = self.store.create(&referral).await.map_err(|e| match e {
            RepositoryError::Duplicate => {
                log::warn!("Referral insert hit the friend email constraint.");
                log::debug!("Friend email already referred: {}", referral.friend_email);
                ServiceError::Duplicate
            }
            e => persistence_error(e),
        })?;
        log::info!("Referral {} stored.", stored.id);
        log::debug!(
            "Referral {}: {} -> {}",
            stored.id,
            stored.referrer_email,
            stored.friend_email
        );

        let message = referral_message(&self.sender, &referral);
        if let Err(e) = self.mailer.send(&message).await {
            log::error!("Failed to send referral email for {}: {}", stored.id, e);
            return Err(ServiceError::Notification(e.to_string()));
        }

        Ok(stored)
    }

    pub async fn list_all(&self) -> Result<Vec<Referral>, ServiceError> {
        self.store.find_all().await.map_err(persistence_error)
    }
}

fn persistence_error(e: RepositoryError) -> ServiceError {
    log::error!("Referral storage failed: {}", e);
    ServiceError::Persistence(e.to_string())
}

pub fn referral_message(sender: &str, referral: &ValidReferral) -> MailMessage {
    MailMessage {
        from: sender.to_string(),
        to: referral.friend_email.clone(),
        subject: REFERRAL_SUBJECT.to_string(),
        text: format!(
            "Hello {},\n\n{} has referred you! Contact them at {}.",
            referral.friend_name, referral.referrer_name, referral.referrer_email
        ),
    }
}

#[async_trait]
impl RequestHandler<ReferralRequest> for ReferralRequestHandler {
    async fn handle_request(&self, request: ReferralRequest) {
        match request {
            ReferralRequest::Submit { referral, response } => {
                let result = self.submit(referral).await;
                let _ = response.send(result);
            }
            ReferralRequest::List { response } => {
                let result = self.list_all().await;
                let _ = response.send(result);
            }
        }
    }
}

pub struct ReferralService;

impl ReferralService {
    pub fn new() -> Self {
        ReferralService {}
    }
}

#[async_trait]
impl Service<ReferralRequest, ReferralRequestHandler> for ReferralService {}
