#![allow(dead_code)]

use actix_web::{
    body::{self, MessageBody},
    dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse},
    http::StatusCode,
    test, web, App,
};
use mongodb::Client;
use std::sync::Arc;

use event_booking_api::{
    config::AppConfig, models::user::UserRole, routes, services::account_service,
    services::pricing_service::PricingPolicy,
};

// Nothing listens on port 1, so database calls fail fast.
const UNREACHABLE_MONGO: &str =
    "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200&connectTimeoutMS=200";

pub const EVENT_ID: &str = "665f1c2a9b1e8a0012345678";

pub struct TestApp {
    pub client: Arc<Client>,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn new() -> Self {
        let client = Client::with_uri_str(UNREACHABLE_MONGO)
            .await
            .expect("test MongoDB URI should parse");

        Self {
            client: Arc::new(client),
            config: test_config(),
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .configure(routes::config)
    }

    pub fn bearer(&self, role: UserRole) -> String {
        let email = match role {
            UserRole::Admin => "admin@event.com",
            UserRole::User => "test@example.com",
        };
        let token = account_service::generate_token(&self.config, EVENT_ID, email, role)
            .expect("token generation should succeed");
        format!("Bearer {}", token)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 5002,
        mongo_uri: UNREACHABLE_MONGO.to_string(),
        database: "EventBookingTest".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        token_ttl_hours: 1,
        admin_email: "admin@event.com".to_string(),
        admin_password: None,
        cors_origin: "http://localhost:3000".to_string(),
        pricing_policy: PricingPolicy::Selection,
    }
}

/// Calls the service and returns the status with the JSON body, if any.
/// Middleware rejections surface as errors, which are rendered here the
/// same way the server would render them.
pub async fn call<S, R, B>(app: &S, req: R) -> (StatusCode, serde_json::Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            let body = test::read_body(resp).await;
            let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
            (status, json)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let json = body::to_bytes(resp.into_body())
                .await
                .ok()
                .and_then(|bytes| serde_json::from_slice(&bytes).ok())
                .unwrap_or(serde_json::Value::Null);
            (status, json)
        }
    }
}
