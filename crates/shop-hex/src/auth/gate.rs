//! Request gates layered onto the protected route groups.
//!
//! `authenticate` turns a bearer token into a [`CurrentUser`] request
//! extension; `require_customer` and `require_admin` then check the role.
//! Layer them so `authenticate` runs first:
//!
//! ```ignore
//! Router::new()
//!     .route("/orders", post(create_order::<R>))
//!     .layer(middleware::from_fn(require_customer))
//!     .layer(middleware::from_fn_with_state(state, authenticate::<R>));
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use shop_types::domain::user::User;
use shop_types::ports::Store;
use uuid::Uuid;

use crate::auth::token::bearer_token;
use crate::errors::AppError;
use crate::inbound::http::AppState;

pub const MSG_NO_TOKEN: &str = "No token provided, authorization denied";
pub const MSG_NOT_ADMIN: &str = "Access denied, not an admin";
pub const MSG_ADMIN_NOT_CUSTOMER: &str = "Admins cannot place or manage customer orders";

/// The authenticated caller, attached to the request by [`authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for CurrentUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            is_admin: u.is_admin,
        }
    }
}

pub async fn authenticate<R: Store>(
    State(state): State<AppState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);
    let Some(token) = token else {
        tracing::warn!(uri = %req.uri(), "missing bearer token");
        return Err(AppError::Unauthorized(MSG_NO_TOKEN.into()));
    };

    let user = match state.users.authenticate(&token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(uri = %req.uri(), error = %e, "authentication failed");
            return Err(e);
        }
    };
    req.extensions_mut().insert(CurrentUser::from(&user));
    Ok(next.run(req).await)
}

fn current(req: &Request) -> Result<&CurrentUser, AppError> {
    req.extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::Unauthorized(MSG_NO_TOKEN.into()))
}

pub async fn require_customer(req: Request, next: Next) -> Result<Response, AppError> {
    if current(&req)?.is_admin {
        return Err(AppError::Forbidden(MSG_ADMIN_NOT_CUSTOMER.into()));
    }
    Ok(next.run(req).await)
}

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = current(&req)?;
    if !user.is_admin {
        tracing::warn!(user_id = %user.id, uri = %req.uri(), "admin route refused");
        return Err(AppError::Forbidden(MSG_NOT_ADMIN.into()));
    }
    Ok(next.run(req).await)
}
