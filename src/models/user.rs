//! Authenticated caller claims

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Caller role carried in the JWT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Visitor,
    Volunteer,
    Admin,
}

/// JWT claims issued by the authentication service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin rights required".to_string()))
        }
    }

    /// Staff may run check-in at the door
    pub fn require_staff(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin | Role::Volunteer => Ok(()),
            Role::Visitor => Err(AppError::Authorization("Staff rights required".to_string())),
        }
    }

    /// Visitors may only act on their own requests
    pub fn require_self_or_admin(&self, visitor_id: Uuid) -> Result<(), AppError> {
        if self.role == Role::Admin || self.sub == visitor_id {
            Ok(())
        } else {
            Err(AppError::Authorization("Not allowed to act on this request".to_string()))
        }
    }
}
