use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::info;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Client,
};
use serde_json::json;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::mongo;
use crate::error::ApiError;
use crate::models::event::{parse_event_date, parse_price, Event, EventInput, OptionInput, PricedOption};
use crate::routes::event::{find_event, parse_object_id, to_view};
use crate::services::pricing_service::PricingService;

fn required_text(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn accept_options(
    candidates: Option<Vec<OptionInput>>,
    kind: &str,
) -> Result<Option<Vec<PricedOption>>, ApiError> {
    let Some(candidates) = candidates else {
        return Ok(None);
    };

    candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| {
            PricingService::accept_option(candidate).ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Invalid {} at position {}: name and numeric price are required",
                    kind,
                    index + 1
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_date(raw: &str) -> Result<chrono::DateTime<Utc>, ApiError> {
    parse_event_date(raw).ok_or_else(|| ApiError::BadRequest("date must be a valid date".to_string()))
}

fn build_event(input: EventInput) -> Result<Event, ApiError> {
    let title = required_text(input.title, "title")?;
    let description = required_text(input.description, "description")?;
    let event_type = required_text(input.event_type, "type")?;
    let location = required_text(input.location, "location")?;
    let date = parse_date(&required_text(input.date, "date")?)?;
    let price = input
        .price
        .as_ref()
        .and_then(parse_price)
        .filter(|price| *price >= 0.0)
        .ok_or_else(|| ApiError::BadRequest("price must be a non-negative number".to_string()))?;
    let packages = accept_options(input.packages, "package")?.unwrap_or_default();
    let add_ons = accept_options(input.add_ons, "add-on")?.unwrap_or_default();

    let now = Utc::now();
    let mut event = Event {
        id: None,
        title,
        description,
        event_type,
        luxury_category: input.luxury_category.unwrap_or_default(),
        date,
        price,
        original_price: input.original_price.as_ref().and_then(parse_price),
        location,
        image: optional_text(input.image),
        packages,
        add_ons,
        short_description: optional_text(input.short_description),
        created_at: Some(now),
        updated_at: Some(now),
    };
    event.apply_defaults();
    Ok(event)
}

/*
    POST /api/admin/events
*/
pub async fn create_event(
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<EventInput>,
) -> Result<HttpResponse, ApiError> {
    let mut event = build_event(input.into_inner())?;

    let result = mongo::events(&client, &config).insert_one(&event).await?;
    event.id = result.inserted_id.as_object_id();
    info!("Created event {:?} ({})", event.id, event.title);

    Ok(HttpResponse::Created().json(to_view(event)))
}

/*
    PUT /api/admin/events/{id}
*/
pub async fn update_event(
    path: web::Path<String>,
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<EventInput>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;
    let input = input.into_inner();

    // Validate everything before touching the stored event.
    let date = optional_text(input.date).map(|raw| parse_date(&raw)).transpose()?;
    let packages = accept_options(input.packages, "package")?;
    let add_ons = accept_options(input.add_ons, "add-on")?;
    let price = input.price.as_ref().and_then(parse_price).filter(|p| *p > 0.0);
    let original_price = input
        .original_price
        .as_ref()
        .and_then(parse_price)
        .filter(|p| *p > 0.0);

    let mut event = find_event(&client, &config, id).await?;

    if let Some(title) = optional_text(input.title) {
        event.title = title;
    }
    if let Some(description) = optional_text(input.description) {
        event.description = description;
    }
    if let Some(event_type) = optional_text(input.event_type) {
        event.event_type = event_type;
    }
    if let Some(category) = input.luxury_category {
        event.luxury_category = category;
    }
    if let Some(date) = date {
        event.date = date;
    }
    if let Some(price) = price {
        event.price = price;
    }
    if let Some(original_price) = original_price {
        event.original_price = Some(original_price);
    }
    if let Some(location) = optional_text(input.location) {
        event.location = location;
    }
    if let Some(image) = optional_text(input.image) {
        event.image = Some(image);
    }
    if let Some(short_description) = optional_text(input.short_description) {
        event.short_description = Some(short_description);
    }
    if let Some(packages) = packages {
        event.packages = packages;
    }
    if let Some(add_ons) = add_ons {
        event.add_ons = add_ons;
    }

    let event = save_event(&client, &config, id, event).await?;
    Ok(HttpResponse::Ok().json(to_view(event)))
}

/*
    DELETE /api/admin/events/{id}
*/
pub async fn delete_event(
    path: web::Path<String>,
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;

    let result = mongo::events(&client, &config)
        .delete_one(doc! { "_id": id })
        .await?;
    if result.deleted_count == 0 {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    info!("Deleted event {}", id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Event deleted" })))
}

/*
    POST /api/admin/events/{id}/packages
*/
pub async fn add_package(
    path: web::Path<String>,
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<OptionInput>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;
    let package = PricingService::accept_option(input.into_inner()).ok_or_else(|| {
        ApiError::BadRequest("Package name and numeric price are required".to_string())
    })?;

    let mut event = find_event(&client, &config, id).await?;
    event.packages.push(package);

    let event = save_event(&client, &config, id, event).await?;
    Ok(HttpResponse::Created().json(to_view(event)))
}

/*
    POST /api/admin/events/{id}/addons
*/
pub async fn add_add_on(
    path: web::Path<String>,
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<OptionInput>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;
    let add_on = PricingService::accept_option(input.into_inner()).ok_or_else(|| {
        ApiError::BadRequest("Add-on name and numeric price are required".to_string())
    })?;

    let mut event = find_event(&client, &config, id).await?;
    event.add_ons.push(add_on);

    let event = save_event(&client, &config, id, event).await?;
    Ok(HttpResponse::Created().json(to_view(event)))
}

async fn save_event(
    client: &Client,
    config: &AppConfig,
    id: ObjectId,
    mut event: Event,
) -> Result<Event, ApiError> {
    event.apply_defaults();
    event.updated_at = Some(Utc::now());

    let result = mongo::events(client, config)
        .replace_one(doc! { "_id": id }, &event)
        .await?;
    if result.matched_count == 0 {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    Ok(event)
}
