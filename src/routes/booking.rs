use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use log::info;
use mongodb::{bson::doc, options::FindOptions, Client};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::mongo;
use crate::error::ApiError;
use crate::models::booking::{Booking, BookingView, CreateBookingInput};
use crate::routes::event::{find_event, parse_object_id};
use crate::services::pricing_service::{PricingService, SelectionError};

/*
    POST /api/bookings
*/
pub async fn create_booking(
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<CreateBookingInput>,
) -> Result<HttpResponse, ApiError> {
    let CreateBookingInput {
        request,
        user,
        attendees,
    } = input.into_inner();

    let user = user
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("user is required".to_string()))?;

    if request.packages.is_empty() {
        return Err(SelectionError::NoPackageSelected.into());
    }

    let event_id = parse_object_id(&request.event_id)?;
    let event = find_event(&client, &config, event_id).await?;
    let priced = PricingService::price_booking(config.pricing_policy, &event, &request, attendees)?;

    let mut booking = Booking::new(event_id, user, priced);

    let result = mongo::bookings(&client, &config).insert_one(&booking).await?;
    booking.id = result.inserted_id.as_object_id();
    info!(
        "Booking {} created for event {} ({} attendee(s), total {})",
        booking.reference, event_id, booking.attendees, booking.total_price
    );

    Ok(HttpResponse::Created().json(BookingView::from(booking)))
}

/*
    GET /api/admin/bookings
*/
pub async fn get_bookings(
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let mut options = FindOptions::default();
    options.sort = Some(doc! { "createdAt": -1 });

    let bookings: Vec<Booking> = mongo::bookings(&client, &config)
        .find(doc! {})
        .with_options(options)
        .await?
        .try_collect()
        .await?;

    let views: Vec<BookingView> = bookings.into_iter().map(BookingView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}
