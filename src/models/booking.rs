use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::event::{AddOn, Package};

/// What the detail view hands to booking creation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default)]
    pub total_price: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingInput {
    #[serde(flatten)]
    pub request: BookingRequest,
    /// Email or user id of whoever is booking.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub attendees: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub event: ObjectId,
    pub packages: Vec<Package>,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
    pub user: String,
    pub attendees: u32,
    pub total_price: f64,
    pub reference: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Server-side pricing of a booking, resolved against the stored event.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedBooking {
    pub packages: Vec<Package>,
    pub add_ons: Vec<AddOn>,
    pub attendees: u32,
    pub total_price: f64,
}

impl Booking {
    pub fn new(event: ObjectId, user: String, priced: PricedBooking) -> Self {
        let now = Utc::now();
        Booking {
            id: None,
            event,
            packages: priced.packages,
            add_ons: priced.add_ons,
            user,
            attendees: priced.attendees,
            total_price: priced.total_price,
            reference: Uuid::new_v4().to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(rename = "_id")]
    pub id: String,
    pub event: String,
    pub packages: Vec<Package>,
    pub add_ons: Vec<AddOn>,
    pub user: String,
    pub attendees: u32,
    pub total_price: f64,
    pub reference: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Booking> for BookingView {
    fn from(booking: Booking) -> Self {
        BookingView {
            id: booking.id.map(|id| id.to_hex()).unwrap_or_default(),
            event: booking.event.to_hex(),
            packages: booking.packages,
            add_ons: booking.add_ons,
            user: booking.user,
            attendees: booking.attendees,
            total_price: booking.total_price,
            reference: booking.reference,
            created_at: booking.created_at,
        }
    }
}
