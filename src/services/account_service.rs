use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{info, warn};
use mongodb::{bson::doc, Client};
use regex::Regex;
use std::sync::OnceLock;

use crate::config::AppConfig;
use crate::db::mongo;
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::models::user::{User, UserRole};

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(
                r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
            )
            .expect("email pattern is valid")
        })
        .is_match(email)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

pub fn generate_token(
    config: &AppConfig,
    user_id: &str,
    email: &str,
    role: UserRole,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();

    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(config.token_ttl_hours)).timestamp() as usize,
        user_id: user_id.to_string(),
        role,
    };

    let header = Header::new(Algorithm::HS256);
    encode(
        &header,
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Makes sure the configured administrator exists with the configured
/// password and the admin role.
pub async fn ensure_admin_account(client: &Client, config: &AppConfig) -> Result<(), ApiError> {
    let Some(password) = config.admin_password.as_deref() else {
        warn!("ADMIN_PASSWORD not set, skipping administrator seeding");
        return Ok(());
    };

    let collection = mongo::users(client, config);
    let email = config.admin_email.to_lowercase();

    match collection.find_one(doc! { "email": &email }).await? {
        Some(existing) => {
            if existing.role == UserRole::Admin && verify_password(password, &existing.password_hash) {
                return Ok(());
            }
            let update = doc! {
                "$set": {
                    "passwordHash": hash_password(password)?,
                    "role": UserRole::Admin.as_str(),
                    "updatedAt": mongo::stored_timestamp(Utc::now()),
                }
            };
            collection.update_one(doc! { "email": &email }, update).await?;
            info!("Administrator account {} refreshed from configuration", email);
        }
        None => {
            let now = Utc::now();
            let admin = User {
                id: None,
                name: Some("Admin".to_string()),
                email: email.clone(),
                password_hash: hash_password(password)?,
                role: UserRole::Admin,
                created_at: Some(now),
                updated_at: Some(now),
            };
            collection.insert_one(&admin).await?;
            info!("Administrator account {} created", email);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;
    use crate::services::pricing_service::PricingPolicy;

    fn test_config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 5002,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            database: "EventBookingTest".to_string(),
            jwt_secret: "unit-test-secret".to_string(),
            token_ttl_hours: 1,
            admin_email: "admin@event.com".to_string(),
            admin_password: None,
            cors_origin: "http://localhost:3000".to_string(),
            pricing_policy: PricingPolicy::Selection,
        }
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("guest@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("guest@"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_token_round_trip() {
        let config = test_config();
        let token = generate_token(&config, "665f1c2a9b1e8a0012345678", "admin@event.com", UserRole::Admin)
            .unwrap();
        let claims = decode_token(&token, &config.jwt_secret).unwrap();

        assert_eq!(claims.sub, "admin@event.com");
        assert_eq!(claims.user_id, "665f1c2a9b1e8a0012345678");
        assert_eq!(claims.role, UserRole::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let config = test_config();
        let token = generate_token(&config, "id", "guest@example.com", UserRole::User).unwrap();
        assert!(decode_token(&token, "another-secret").is_err());
    }

    #[test]
    fn test_password_hash_verifies() {
        let hash = hash_password("Admin1234").unwrap();
        assert!(verify_password("Admin1234", &hash));
        assert!(!verify_password("admin1234", &hash));
        assert!(!verify_password("Admin1234", "not-a-hash"));
    }
}
