use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex, Once,
};

use async_trait::async_trait;

use crate::models::referrals::{Referral, ValidReferral};
use crate::repositories::{
    mail::{MailError, MailMessage, Mailer},
    referrals::{ReferralStore, RepositoryError},
};

/// In-memory store with the same friend-email uniqueness as the table.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Referral>>,
    /// Makes `find_by_friend_email` miss, so the insert sees the conflict.
    pub skip_lookup: AtomicBool,
    pub unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn rows(&self) -> Vec<Referral> {
        self.rows.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), RepositoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl ReferralStore for MemoryStore {
    async fn find_by_friend_email(
        &self,
        friend_email: &str,
    ) -> Result<Option<Referral>, RepositoryError> {
        self.check_available()?;
        if self.skip_lookup.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|r| r.friend_email == friend_email).cloned())
    }

    async fn create(&self, referral: &ValidReferral) -> Result<Referral, RepositoryError> {
        self.check_available()?;

        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.friend_email == referral.friend_email) {
            return Err(RepositoryError::Duplicate);
        }

        let stored = Referral {
            id: uuid::Uuid::new_v4().hyphenated().to_string(),
            referrer_name: referral.referrer_name.clone(),
            referrer_email: referral.referrer_email.clone(),
            friend_name: referral.friend_name.clone(),
            friend_email: referral.friend_email.clone(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        rows.push(stored.clone());

        Ok(stored)
    }

    async fn find_all(&self) -> Result<Vec<Referral>, RepositoryError> {
        self.check_available()?;
        Ok(self.rows())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
    pub failing: AtomicBool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        let mailer = Self::default();
        mailer.failing.store(true, Ordering::SeqCst);
        mailer
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message.clone());

        if self.failing.load(Ordering::SeqCst) {
            let refused = "relay unavailable".parse::<lettre::Address>().unwrap_err();
            return Err(MailError::Address(refused));
        }
        Ok(())
    }
}

/// Global logger keeping every record so tests can inspect what reaches the log.
struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};
static INSTALL_LOGGER: Once = Once::new();

pub fn capture_logs() {
    INSTALL_LOGGER.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(log::LevelFilter::Trace);
    });
}

/// Records logged so far by every test in this process.
pub fn captured_logs() -> Vec<(log::Level, String)> {
    LOGGER.records.lock().unwrap().clone()
}
