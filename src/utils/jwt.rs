// src/utils/jwt.rs

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Roles issued by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    /// Roles allowed to author and manage assessments.
    pub fn can_author(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin | Role::Teacher)
    }
}

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    pub role: Role,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// The verified caller, injected into request extensions by `auth_middleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub role: Role,
}

impl TryFrom<Claims> for Principal {
    type Error = AppError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::ValidationError("Token subject is not a user id".to_string()))?;
        Ok(Principal {
            id,
            role: claims.role,
        })
    }
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid. Tokens are issued by the identity service;
/// this crate only checks them.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::ValidationError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects the `Principal` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    let principal = verify_jwt(token, &config.jwt_secret)
        .and_then(Principal::try_from)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Axum Middleware: Author Authorization.
///
/// Must be used AFTER `auth_middleware`. Teachers and administrators pass.
pub async fn author_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !principal.role.can_author() {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}

/// Axum Middleware: Student Authorization.
///
/// Must be used AFTER `auth_middleware`.
pub async fn student_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let principal = req
        .extensions()
        .get::<Principal>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if principal.role != Role::Student {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
