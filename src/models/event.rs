use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// A named, priced option nested inside an event. Packages and add-ons
/// share this shape.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PricedOption {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(deserialize_with = "deserialize_price", default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub type Package = PricedOption;
pub type AddOn = PricedOption;

impl PricedOption {
    pub fn new(name: &str, price: f64) -> Self {
        PricedOption {
            id: None,
            name: name.to_string(),
            price: normalize_price(price),
            description: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Gives the option a stable identifier if it does not carry one yet.
    pub fn ensure_id(&mut self) {
        if self.id.as_deref().map_or(true, str::is_empty) {
            self.id = Some(ObjectId::new().to_hex());
        }
    }
}

/// Untyped package/add-on candidate as submitted by the admin form.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct OptionInput {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum LuxuryCategory {
    #[default]
    Normal,
    Luxury,
    #[serde(rename = "Full Luxury")]
    FullLuxury,
}

impl LuxuryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LuxuryCategory::Normal => "Normal",
            LuxuryCategory::Luxury => "Luxury",
            LuxuryCategory::FullLuxury => "Full Luxury",
        }
    }
}

impl fmt::Display for LuxuryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LuxuryCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "normal" => Ok(LuxuryCategory::Normal),
            "luxury" => Ok(LuxuryCategory::Luxury),
            "full luxury" => Ok(LuxuryCategory::FullLuxury),
            other => Err(format!("Unknown luxury category: {}", other)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub luxury_category: LuxuryCategory,
    pub date: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_price", default)]
    pub price: f64,
    #[serde(
        deserialize_with = "deserialize_optional_price",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_price: Option<f64>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(deserialize_with = "deserialize_embedded_list", default)]
    pub packages: Vec<Package>,
    #[serde(deserialize_with = "deserialize_embedded_list", default)]
    pub add_ons: Vec<AddOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Save-time invariants: a falsy original price falls back to the
    /// active price and every nested option carries an id.
    pub fn apply_defaults(&mut self) {
        self.price = normalize_price(self.price);
        match self.original_price {
            Some(original) if original > 0.0 && original.is_finite() => {}
            _ => self.original_price = Some(self.price),
        }
        self.packages.iter_mut().for_each(PricedOption::ensure_id);
        self.add_ons.iter_mut().for_each(PricedOption::ensure_id);
    }
}

/// Body of the admin create endpoint. Everything is optional at the serde
/// level so that missing fields become validation messages.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub luxury_category: Option<LuxuryCategory>,
    pub date: Option<String>,
    pub price: Option<serde_json::Value>,
    pub original_price: Option<serde_json::Value>,
    pub location: Option<String>,
    pub image: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_embedded_list", default)]
    pub packages: Option<Vec<OptionInput>>,
    #[serde(deserialize_with = "deserialize_optional_embedded_list", default)]
    pub add_ons: Option<Vec<OptionInput>>,
    pub short_description: Option<String>,
}

/// Event with the display fields the detail and list views need.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub event: Event,
    pub discount_percent: u8,
}

impl EventView {
    pub fn new(mut event: Event, discount_percent: u8) -> Self {
        let id = event.id.take().map(|id| id.to_hex()).unwrap_or_default();
        EventView {
            id,
            event,
            discount_percent,
        }
    }
}

/// Non-finite and negative prices collapse to zero.
pub fn normalize_price(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 {
        price
    } else {
        0.0
    }
}

/// Reads a price from a JSON number or a numeric string.
pub fn parse_price(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite())
}

/// Accepts RFC 3339 timestamps as well as the shorter values produced by
/// HTML `date` and `datetime-local` inputs.
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(parse_price)
        .map(normalize_price)
        .unwrap_or(0.0))
}

fn deserialize_optional_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_price).map(normalize_price))
}

// Multipart forms send nested lists as JSON-encoded strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddedList<T> {
    List(Vec<T>),
    Encoded(String),
}

fn deserialize_optional_embedded_list<'de, D, T>(
    deserializer: D,
) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<EmbeddedList<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(EmbeddedList::List(items)) => Ok(Some(items)),
        Some(EmbeddedList::Encoded(raw)) if raw.trim().is_empty() => Ok(None),
        Some(EmbeddedList::Encoded(raw)) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(de::Error::custom),
    }
}

fn deserialize_embedded_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(deserialize_optional_embedded_list(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_json() -> serde_json::Value {
        json!({
            "title": "Jazz Night",
            "description": "Live jazz",
            "type": "music",
            "date": "2030-05-01T19:00:00Z",
            "price": 500,
            "location": "Colombo",
        })
    }

    #[test]
    fn test_event_defaults_when_fields_missing() {
        let event: Event = serde_json::from_value(event_json()).unwrap();
        assert_eq!(event.luxury_category, LuxuryCategory::Normal);
        assert!(event.packages.is_empty());
        assert!(event.add_ons.is_empty());
        assert_eq!(event.original_price, None);
    }

    #[test]
    fn test_malformed_prices_become_zero() {
        let mut value = event_json();
        value["price"] = json!("abc");
        value["packages"] = json!([{ "name": "Basic", "price": null }, { "name": "VIP", "price": -20 }]);
        let event: Event = serde_json::from_value(value).unwrap();
        assert_eq!(event.price, 0.0);
        assert_eq!(event.packages[0].price, 0.0);
        assert_eq!(event.packages[1].price, 0.0);
    }

    #[test]
    fn test_numeric_string_prices_are_accepted() {
        let option: PricedOption =
            serde_json::from_value(json!({ "name": "Parking", "price": " 150.5 " })).unwrap();
        assert_eq!(option.price, 150.5);
    }

    #[test]
    fn test_packages_may_arrive_json_encoded() {
        let mut value = event_json();
        value["packages"] = json!("[{\"name\":\"Basic\",\"price\":200}]");
        value["addOns"] = json!("");
        let event: Event = serde_json::from_value(value).unwrap();
        assert_eq!(event.packages, vec![PricedOption::new("Basic", 200.0)]);
        assert!(event.add_ons.is_empty());
    }

    #[test]
    fn test_apply_defaults_sets_original_price_and_ids() {
        let mut value = event_json();
        value["originalPrice"] = json!(0);
        value["packages"] = json!([{ "name": "Basic", "price": 200 }]);
        value["addOns"] = json!([{ "_id": "a1", "name": "Photographer", "price": 150 }]);
        let mut event: Event = serde_json::from_value(value).unwrap();
        event.apply_defaults();

        assert_eq!(event.original_price, Some(500.0));
        assert!(event.packages[0].id.is_some());
        assert_eq!(event.add_ons[0].id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_apply_defaults_keeps_real_discount() {
        let mut value = event_json();
        value["originalPrice"] = json!(1000);
        let mut event: Event = serde_json::from_value(value).unwrap();
        event.apply_defaults();
        assert_eq!(event.original_price, Some(1000.0));
    }

    #[test]
    fn test_luxury_category_parsing() {
        assert_eq!("full luxury".parse::<LuxuryCategory>(), Ok(LuxuryCategory::FullLuxury));
        assert_eq!("Full-Luxury".parse::<LuxuryCategory>(), Ok(LuxuryCategory::FullLuxury));
        assert_eq!("LUXURY".parse::<LuxuryCategory>(), Ok(LuxuryCategory::Luxury));
        assert!("premium".parse::<LuxuryCategory>().is_err());

        let serialized = serde_json::to_value(LuxuryCategory::FullLuxury).unwrap();
        assert_eq!(serialized, json!("Full Luxury"));
    }

    #[test]
    fn test_parse_event_date_variants() {
        assert!(parse_event_date("2030-05-01T19:00:00Z").is_some());
        assert!(parse_event_date("2030-05-01T19:00").is_some());
        assert_eq!(
            parse_event_date("2030-05-01").map(|d| d.to_rfc3339()),
            Some("2030-05-01T00:00:00+00:00".to_string())
        );
        assert!(parse_event_date("next friday").is_none());
    }

    #[test]
    fn test_event_view_moves_id_to_hex() {
        let mut event: Event = serde_json::from_value(event_json()).unwrap();
        let id = ObjectId::new();
        event.id = Some(id);
        let view = serde_json::to_value(EventView::new(event, 50)).unwrap();
        assert_eq!(view["_id"], json!(id.to_hex()));
        assert_eq!(view["discountPercent"], json!(50));
        assert_eq!(view["type"], json!("music"));
    }
}
