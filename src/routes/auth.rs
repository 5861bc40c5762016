use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::Client;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::mongo;
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::user::{AuthResponse, LoginInput, RegisterInput, User, UserRole, UserSummary};
use crate::services::account_service::{
    generate_token, hash_password, is_valid_email, verify_password,
};

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

fn auth_response(config: &AppConfig, user: &User) -> Result<AuthResponse, ApiError> {
    let summary = UserSummary::from(user);
    let token = generate_token(config, &summary.id, &user.email, user.role)?;
    Ok(AuthResponse {
        token,
        user: summary,
    })
}

/*
    POST /api/auth/register
*/
pub async fn register(
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<RegisterInput>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    let email = input.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if input.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if email == config.admin_email.to_lowercase() {
        return Err(ApiError::BadRequest(
            "This email is reserved for the administrator".to_string(),
        ));
    }

    let collection = mongo::users(&client, &config);
    if collection.find_one(doc! { "email": &email }).await?.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let now = Utc::now();
    let mut user = User {
        id: None,
        name: input.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        email,
        password_hash: hash_password(&input.password)?,
        role: UserRole::User,
        created_at: Some(now),
        updated_at: Some(now),
    };

    match collection.insert_one(&user).await {
        Ok(result) => user.id = result.inserted_id.as_object_id(),
        Err(err) if is_duplicate_key(&err) => {
            return Err(ApiError::BadRequest("User already exists".to_string()));
        }
        Err(err) => return Err(err.into()),
    }
    info!("Registered user {}", user.email);

    Ok(HttpResponse::Created().json(auth_response(&config, &user)?))
}

/*
    POST /api/auth/login
*/
pub async fn login(
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<LoginInput>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    let (Some(email), Some(password)) = (
        input.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()),
        input.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Email and password required".to_string()));
    };

    let user = mongo::users(&client, &config)
        .find_one(doc! { "email": &email })
        .await?
        .filter(|user| verify_password(&password, &user.password_hash))
        .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;

    Ok(HttpResponse::Ok().json(auth_response(&config, &user)?))
}

/*
    GET /api/auth/session
*/
pub async fn session(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(UserSummary {
        id: user.user_id,
        email: user.email,
        role: user.role,
        name: None,
    })
}
