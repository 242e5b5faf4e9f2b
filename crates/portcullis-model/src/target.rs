use crate::ValidateError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reachable managed host. Deactivation removes the target from
/// eligibility without deleting history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub name: String,
    pub hostname: String,
    pub port: u16,
    pub server_public_key: String,
    pub description: String,
    pub is_active: bool,
    pub updated_by: String,
    pub updated_at: i64,
}

impl Target {
    pub fn new(updated_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            hostname: String::new(),
            port: 22,
            server_public_key: String::new(),
            description: String::new(),
            is_active: true,
            updated_by: updated_by.into(),
            updated_at: crate::now_millis(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn set_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Ports are 1–65535; `u16` covers the upper bound, zero is rejected here.
    pub fn validate(&self) -> Result<(), ValidateError> {
        if self.name.trim().is_empty() {
            return Err(ValidateError::NameEmpty);
        }
        if self.hostname.trim().is_empty() {
            return Err(ValidateError::HostnameEmpty);
        }
        if self.port == 0 {
            return Err(ValidateError::PortZero);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_port_and_empty_fields() {
        let target = Target::new("admin-id")
            .with_name("edge-1")
            .with_hostname("edge-1.example.com")
            .with_port(2222);
        assert!(target.validate().is_ok());

        let bad = target.clone().with_port(0);
        assert_eq!(bad.validate(), Err(ValidateError::PortZero));

        let bad = target.clone().with_name("  ");
        assert_eq!(bad.validate(), Err(ValidateError::NameEmpty));

        let bad = target.with_hostname("");
        assert_eq!(bad.validate(), Err(ValidateError::HostnameEmpty));
    }
}
