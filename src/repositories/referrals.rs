use crate::models::referrals::{Referral, ValidReferral};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Friend email is already referred")]
    Duplicate,
    #[error("{0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ReferralStore: Send + Sync + 'static {
    async fn find_by_friend_email(
        &self,
        friend_email: &str,
    ) -> Result<Option<Referral>, RepositoryError>;

    /// Inserts a referral. The friend-email unique constraint is enforced here,
    /// surfacing as `RepositoryError::Duplicate`.
    async fn create(&self, referral: &ValidReferral) -> Result<Referral, RepositoryError>;

    async fn find_all(&self) -> Result<Vec<Referral>, RepositoryError>;
}

#[derive(Clone)]
pub struct ReferralRepository {
    conn: PgPool,
}

impl ReferralRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ReferralStore for ReferralRepository {
    async fn find_by_friend_email(
        &self,
        friend_email: &str,
    ) -> Result<Option<Referral>, RepositoryError> {
        let referral = sqlx::query_as::<_, Referral>(
            "SELECT * FROM referrals WHERE friend_email = $1",
        )
        .bind(friend_email)
        .fetch_optional(&self.conn)
        .await?;

        Ok(referral)
    }

    async fn create(&self, referral: &ValidReferral) -> Result<Referral, RepositoryError> {
        let referral_id = Uuid::new_v4().hyphenated().to_string();

        let result = sqlx::query_as::<_, Referral>(
            r#"
                INSERT INTO referrals
                (id, referrer_name, referrer_email, friend_name, friend_email)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            "#,
        )
        .bind(&referral_id)
        .bind(&referral.referrer_name)
        .bind(&referral.referrer_email)
        .bind(&referral.friend_name)
        .bind(&referral.friend_email)
        .fetch_one(&self.conn)
        .await;

        match result {
            Ok(referral) => Ok(referral),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RepositoryError::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_all(&self) -> Result<Vec<Referral>, RepositoryError> {
        let referrals = sqlx::query_as::<_, Referral>(
            "SELECT * FROM referrals ORDER BY created_at, id",
        )
        .fetch_all(&self.conn)
        .await?;

        Ok(referrals)
    }
}
