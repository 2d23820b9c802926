use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::{enums::Role, users::Entity as Users},
    error::AppError,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

/// Passes when the caller's role is `role` or above it.
pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if !user.role.at_least(role) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

pub fn ensure_manager(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Manager)
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Staff)
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser {
        user_id,
        role: decoded.claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let Some(token) = auth_str.strip_prefix("Bearer ") else {
            return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
        };

        let claimed = decode_token(token.trim(), &state.config.jwt_secret)?;

        // role changes apply to tokens issued before them
        let user = Users::find_by_id(claimed.user_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

        Ok(AuthUser {
            user_id: user.id,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth_service::issue_token;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn role_guards() {
        assert!(ensure_admin(&user(Role::Admin)).is_ok());
        assert!(ensure_admin(&user(Role::Manager)).is_err());
        assert!(ensure_manager(&user(Role::Admin)).is_ok());
        assert!(ensure_staff(&user(Role::Manager)).is_ok());
        assert!(matches!(
            ensure_staff(&user(Role::Customer)),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn issued_tokens_decode_back() {
        let id = Uuid::new_v4();
        let token = issue_token(id, Role::Staff, "test-secret", 1).unwrap();
        let auth = decode_token(&token, "test-secret").unwrap();
        assert_eq!(auth.user_id, id);
        assert_eq!(auth.role, Role::Staff);
        assert!(matches!(
            decode_token(&token, "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
