use crate::error::{ApiError, ApiException, ErrorCode};

/// Outcome of a mutating backend call.
///
/// Transport failures never reach this type; they surface as the `Err` side
/// of the service call that produced the envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(Option<T>),
    Failure(ApiError),
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self::Success(Some(data))
    }

    pub fn empty() -> Self {
        Self::Success(None)
    }

    pub fn rejected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure(ApiError::new(code, message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<Option<T>, ApiException> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure(err) => Err(err.into()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        match self {
            Self::Success(data) => Envelope::Success(data.map(f)),
            Self::Failure(err) => Envelope::Failure(err),
        }
    }
}
