use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bastion login account.
///
/// Accounts are created by an administrator, mutated on credential rotation,
/// and never physically deleted; deactivation flips `is_active` and removes
/// the account from eligibility while keeping history intact. The password
/// hash and authorized keys are carried opaquely — verifying them is the
/// authentication layer's job, not this crate's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    password_hash: Option<String>,
    authorized_keys: Vec<String>,
    pub force_init_pass: bool,
    pub is_active: bool,
    pub updated_by: String,
    pub updated_at: i64,
}

impl User {
    pub fn new(updated_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: String::new(),
            email: None,
            password_hash: None,
            authorized_keys: Vec::new(),
            force_init_pass: true,
            is_active: true,
            updated_by: updated_by.into(),
            updated_at: crate::now_millis(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_password_hash(mut self, password_hash: Option<String>) -> Self {
        self.password_hash = password_hash;
        self
    }

    pub fn with_authorized_keys(mut self, authorized_keys: Vec<String>) -> Self {
        self.authorized_keys = authorized_keys;
        self
    }

    pub fn set_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn take_password_hash(&mut self) -> Option<String> {
        self.password_hash.take()
    }

    pub fn authorized_keys(&self) -> &[String] {
        &self.authorized_keys
    }

    /// Masked rendering for listings and logs.
    pub fn print_password(&self) -> String {
        if self.password_hash.is_some() {
            "********".to_string()
        } else {
            String::new()
        }
    }

    pub fn print_authorized_keys(&self) -> String {
        if self.authorized_keys.is_empty() {
            return String::new();
        }
        "********".to_string()
    }
}
