use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::{AppError, FieldError};

/// Field-level checks run on a request body after it deserialised.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;
}

/// `Json<T>` that answers 400 for unreadable bodies and runs
/// [`Validate`] before the handler sees the value.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::BadRequest(e.body_text()))?;
        let errors = value.validate();
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(Self(value))
    }
}

pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {what} id")))
}

/// Collects one error per missing or blank required field.
pub(crate) fn require_text(errors: &mut Vec<FieldError>, field: &str, value: &Option<String>) {
    if value.as_deref().map(str::trim).unwrap_or_default().is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
    }
}
