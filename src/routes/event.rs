use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::FindOptions,
    Client,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::mongo;
use crate::error::ApiError;
use crate::models::event::{AddOn, Event, EventView, LuxuryCategory, Package};
use crate::services::pricing_service::{PricingService, Selection};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub luxury_category: Option<String>,
    pub upcoming: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
}

pub(crate) fn parse_object_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest("Invalid ID".to_string()))
}

pub(crate) async fn find_event(
    client: &Client,
    config: &AppConfig,
    id: ObjectId,
) -> Result<Event, ApiError> {
    mongo::events(client, config)
        .find_one(doc! { "_id": id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
}

pub(crate) fn to_view(event: Event) -> EventView {
    let discount = PricingService::compute_discount_percent(&event);
    EventView::new(event, discount)
}

async fn find_sorted(
    client: &Client,
    config: &AppConfig,
    filter: Document,
    limit: Option<i64>,
) -> Result<Vec<EventView>, ApiError> {
    let mut options = FindOptions::default();
    options.sort = Some(doc! { "date": 1 });
    options.limit = limit.filter(|limit| *limit > 0);

    let events: Vec<Event> = mongo::events(client, config)
        .find(filter)
        .with_options(options)
        .await?
        .try_collect()
        .await?;

    Ok(events.into_iter().map(to_view).collect())
}

/*
    GET /api/events
*/
pub async fn get_events(
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    params: web::Query<EventQuery>,
) -> Result<HttpResponse, ApiError> {
    let mut filter = doc! {};

    if let Some(event_type) = params
        .event_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("all"))
    {
        filter.insert(
            "type",
            doc! {
                "$regex": format!("^{}$", regex::escape(event_type)),
                "$options": "i"
            },
        );
    }

    if let Some(raw) = params.luxury_category.as_deref() {
        let category: LuxuryCategory = raw.parse().map_err(ApiError::BadRequest)?;
        filter.insert("luxuryCategory", category.as_str());
    }

    if params.upcoming.unwrap_or(false) {
        filter.insert("date", doc! { "$gte": mongo::stored_timestamp(Utc::now()) });
    }

    let events = find_sorted(&client, &config, filter, params.limit).await?;
    Ok(HttpResponse::Ok().json(events))
}

/*
    GET /api/events/luxury/{luxury_category}
*/
pub async fn get_by_luxury_category(
    path: web::Path<String>,
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let category: LuxuryCategory = path.into_inner().parse().map_err(ApiError::BadRequest)?;
    let filter = doc! { "luxuryCategory": category.as_str() };

    let events = find_sorted(&client, &config, filter, None).await?;
    Ok(HttpResponse::Ok().json(events))
}

/*
    GET /api/events/{id}
*/
pub async fn get_by_id(
    path: web::Path<String>,
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;
    let event = find_event(&client, &config, id).await?;
    Ok(HttpResponse::Ok().json(to_view(event)))
}

/*
    POST /api/events/{id}/quote
*/
pub async fn quote(
    path: web::Path<String>,
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<QuoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;
    let input = input.into_inner();
    let requested = Selection::new(input.packages, input.add_ons);

    let event = find_event(&client, &config, id).await?;
    let selection = PricingService::validate_selection(&event, &requested)?;

    Ok(HttpResponse::Ok().json(PricingService::quote(
        config.pricing_policy,
        &event,
        &selection,
    )))
}
