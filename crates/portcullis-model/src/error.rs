use thiserror::Error;

/// Validation failures for directory records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("name cannot be empty")]
    NameEmpty,
    #[error("hostname cannot be empty")]
    HostnameEmpty,
    #[error("port cannot be zero")]
    PortZero,
    #[error("user cannot be empty")]
    UserEmpty,
    #[error("secret must carry a password or a private key")]
    MissingCredential,
    #[error("secret cannot carry both a password and a key pair")]
    AmbiguousCredential,
    #[error("public key requires a matching private key")]
    OrphanPublicKey,
}
