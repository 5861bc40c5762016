use actix_web::web;

use crate::error::ApiError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::user::UserRole;

pub mod admin;
pub mod auth;
pub mod booking;
pub mod event;
pub mod health;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health_check))
    .service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("/session", web::get().to(auth::session)),
                    ),
            )
            .service(
                web::scope("/events")
                    .route("", web::get().to(event::get_events))
                    .route(
                        "/luxury/{luxury_category}",
                        web::get().to(event::get_by_luxury_category),
                    )
                    .route("/{id}", web::get().to(event::get_by_id))
                    .route("/{id}/quote", web::post().to(event::quote)),
            )
            .route("/bookings", web::post().to(booking::create_booking))
            // AuthMiddleware is registered last so it runs before RequireRole.
            .service(
                web::scope("/admin")
                    .wrap(RequireRole::new(UserRole::Admin))
                    .wrap(AuthMiddleware)
                    .route("/events", web::post().to(admin::create_event))
                    .route("/events/{id}", web::put().to(admin::update_event))
                    .route("/events/{id}", web::delete().to(admin::delete_event))
                    .route("/events/{id}/packages", web::post().to(admin::add_package))
                    .route("/events/{id}/addons", web::post().to(admin::add_add_on))
                    .route("/bookings", web::get().to(booking::get_bookings)),
            ),
    );
}
