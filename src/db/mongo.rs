use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::{booking::Booking, event::Event, user::User};

const EVENTS: &str = "Events";
const BOOKINGS: &str = "Bookings";
const USERS: &str = "Users";

pub async fn create_mongo_client(uri: &str, database: &str) -> mongodb::error::Result<Arc<Client>> {
    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;

    match client.database(database).run_command(doc! {"ping": 1}).await {
        Ok(_) => info!("Connected to MongoDB and verified with ping"),
        Err(e) => {
            warn!("Connected to MongoDB but ping failed: {}", e);
            warn!("The API may still work, but some functionality might be impaired");
        }
    }

    Ok(Arc::new(client))
}

pub async fn ensure_indexes(client: &Client, config: &AppConfig) -> mongodb::error::Result<()> {
    let unique_email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    users(client, config).create_index(unique_email).await?;

    let by_date = IndexModel::builder().keys(doc! { "date": 1 }).build();
    events(client, config).create_index(by_date).await?;

    Ok(())
}

pub async fn ping(client: &Client, config: &AppConfig) -> mongodb::error::Result<()> {
    client
        .database(&config.database)
        .run_command(doc! {"ping": 1})
        .await
        .map(|_| ())
}

/// Timestamp text as chrono's serde form writes it into documents, for
/// raw `doc!` filters and updates.
pub fn stored_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn events(client: &Client, config: &AppConfig) -> Collection<Event> {
    client.database(&config.database).collection(EVENTS)
}

pub fn bookings(client: &Client, config: &AppConfig) -> Collection<Booking> {
    client.database(&config.database).collection(BOOKINGS)
}

pub fn users(client: &Client, config: &AppConfig) -> Collection<User> {
    client.database(&config.database).collection(USERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stored_timestamp_matches_serde_form() {
        let whole = Utc.with_ymd_and_hms(2030, 5, 1, 19, 0, 0).unwrap();
        let fractional = Utc::now();

        for at in [whole, fractional] {
            let serialized = serde_json::to_value(at).unwrap();
            assert_eq!(serialized, serde_json::json!(stored_timestamp(at)));
        }
        assert_eq!(stored_timestamp(whole), "2030-05-01T19:00:00Z");
    }
}
