//! Authentication boundary: card-number login and token issuance
//!
//! Circulation treats identity as given; this service only turns a library
//! card number into signed claims the extractor can verify.

use chrono::{Duration, Utc};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Log in with a card number. Returns the signed token and the member.
    pub fn login(&self, card_number: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .find_by_card(card_number)
            .ok_or_else(|| AppError::Authentication("Unknown card number".to_string()))?;

        let token = self.issue_token(&user)?;
        Ok((token, user))
    }

    /// Sign claims for a member.
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = UserClaims {
            sub: user.id,
            name: user.name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.config.jwt_expiration_hours as i64)).timestamp(),
        };
        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{CreateUser, Role};

    #[test]
    fn login_round_trips_claims() {
        let repository = Repository::new();
        let user = repository
            .users
            .insert(CreateUser {
                name: "Ada".to_string(),
                card_number: "CARD-7".to_string(),
                role: Some(Role::Staff),
            })
            .unwrap();

        let config = AuthConfig::default();
        let auth = AuthService::new(repository, config.clone());

        let (token, _) = auth.login("CARD-7").unwrap();
        let claims = UserClaims::from_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Staff);

        assert!(auth.login("CARD-8").is_err());
    }
}
