use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A retail/wholesale customer with a pricing profile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Pricing tier: retail | wholesale | legal_entity
    pub profile: String,
    pub discount_pct: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientLegalEntity {
    pub id: Uuid,
    pub client_id: Uuid,
    pub legal_name: String,
    pub inn: String,
    pub ogrn: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientContract {
    pub id: Uuid,
    pub client_id: Uuid,
    pub number: String,
    pub signed_on: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    /// active | suspended | expired
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientContact {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub role: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A vehicle in the client's garage, used to match catalog parts.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientVehicle {
    pub id: Uuid,
    pub client_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: Option<String>,
    pub plate: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
