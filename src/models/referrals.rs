use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: String,
    pub referrer_name: String,
    pub referrer_email: String,
    pub friend_name: String,
    pub friend_email: String,
    pub created_at: chrono::NaiveDateTime,
}

/// Submission body as received. Fields stay optional so that a missing one is
/// reported as a validation failure instead of a deserialization error.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReferral {
    pub referrer_name: Option<String>,
    pub referrer_email: Option<String>,
    pub friend_name: Option<String>,
    pub friend_email: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidReferral {
    pub referrer_name: String,
    pub referrer_email: String,
    pub friend_name: String,
    pub friend_email: String,
}

impl NewReferral {
    /// Returns `None` when any field is absent or empty.
    pub fn validate(self) -> Option<ValidReferral> {
        fn present(field: Option<String>) -> Option<String> {
            field.filter(|value| !value.is_empty())
        }

        Some(ValidReferral {
            referrer_name: present(self.referrer_name)?,
            referrer_email: present(self.referrer_email)?,
            friend_name: present(self.friend_name)?,
            friend_email: present(self.friend_email)?,
        })
    }
}
