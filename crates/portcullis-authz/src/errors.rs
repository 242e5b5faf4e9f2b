use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    /// Infrastructure failure reading a store. Deliberately not coerced into
    /// a Deny decision: failing closed on infrastructure failure is the
    /// caller's policy choice.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
