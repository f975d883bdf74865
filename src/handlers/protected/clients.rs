use axum::extract::{Extension, Path, Query};
use axum::response::Json;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::{
    AuditAction, Client, ClientContact, ClientContract, ClientLegalEntity, ClientVehicle,
};
use crate::database::{self, Repository};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::AuthUser;
use crate::services::AuditService;

const PROFILES: &[&str] = &["retail", "wholesale", "legal_entity"];
const CONTRACT_STATUSES: &[&str] = &["active", "suspended", "expired"];

#[derive(Debug, Deserialize)]
pub struct ClientListQuery {
    pub profile: Option<String>,
    /// Substring match on name or email
    pub q: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/clients
pub async fn list(Query(query): Query<ClientListQuery>) -> Result<Json<Value>, ApiError> {
    let mut conditions = Vec::new();
    if let Some(ref profile) = query.profile {
        validate_profile(profile)?;
        conditions.push(json!({ "profile": profile }));
    }
    if let Some(ref q) = query.q {
        let pattern = format!("%{}%", q);
        conditions.push(json!({
            "$or": [
                { "name": { "$ilike": pattern } },
                { "email": { "$ilike": pattern } }
            ]
        }));
    }
    let where_clause = match conditions.len() {
        0 => None,
        1 => Some(conditions.remove(0)),
        _ => Some(json!({ "$and": conditions })),
    };

    let pool = database::pool().await?;
    let repo = Repository::<Client>::new("clients", pool.clone());
    let filter = FilterData {
        where_clause,
        order: Some(json!("name asc")),
        limit: query.limit,
        offset: query.offset,
        ..Default::default()
    };
    let total = repo.count(filter.clone()).await?;
    let clients = repo.select_any(filter).await?;

    Ok(Json(json!({ "success": true, "data": clients, "total": total })))
}

#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub profile: String,
    #[serde(default)]
    pub discount_pct: Decimal,
}

/// POST /api/clients
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateClientRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation_error(
            "Client name is required",
            Some([("name".to_string(), "required".to_string())].into()),
        ));
    }
    validate_profile(&payload.profile)?;
    validate_discount(payload.discount_pct)?;

    let pool = database::pool().await?;
    let client = sqlx::query_as::<_, Client>(
        "INSERT INTO clients (id, name, email, phone, profile, discount_pct) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.trim())
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.profile)
    .bind(payload.discount_pct)
    .fetch_one(pool)
    .await?;

    AuditService::record(
        &user,
        AuditAction::Create,
        "client",
        Some(client.id),
        json!({ "name": client.name, "profile": client.profile }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": client })))
}

/// GET /api/clients/:id - client with all child collections
pub async fn get(Path(id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let client = fetch_client(id).await?;

    let legal_entities = sqlx::query_as::<_, ClientLegalEntity>(
        "SELECT * FROM client_legal_entities \
         WHERE client_id = $1 AND deleted_at IS NULL ORDER BY created_at",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let contracts = sqlx::query_as::<_, ClientContract>(
        "SELECT * FROM client_contracts \
         WHERE client_id = $1 AND deleted_at IS NULL ORDER BY signed_on DESC",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let contacts = sqlx::query_as::<_, ClientContact>(
        "SELECT * FROM client_contacts \
         WHERE client_id = $1 AND deleted_at IS NULL ORDER BY created_at",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let garage = sqlx::query_as::<_, ClientVehicle>(
        "SELECT * FROM client_vehicles \
         WHERE client_id = $1 AND deleted_at IS NULL ORDER BY created_at",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "client": client,
            "legal_entities": legal_entities,
            "contracts": contracts,
            "contacts": contacts,
            "garage": garage,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateClientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile: Option<String>,
    pub discount_pct: Option<Decimal>,
}

/// PUT /api/clients/:id
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateClientRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Some(ref profile) = payload.profile {
        validate_profile(profile)?;
    }
    if let Some(discount) = payload.discount_pct {
        validate_discount(discount)?;
    }

    let pool = database::pool().await?;
    let client = sqlx::query_as::<_, Client>(
        "UPDATE clients SET \
            name = COALESCE($2, name), \
            email = COALESCE($3, email), \
            phone = COALESCE($4, phone), \
            profile = COALESCE($5, profile), \
            discount_pct = COALESCE($6, discount_pct), \
            updated_at = $7 \
         WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(id)
    .bind(payload.name.as_deref().map(str::trim))
    .bind(payload.email.as_deref())
    .bind(payload.phone.as_deref())
    .bind(payload.profile.as_deref())
    .bind(payload.discount_pct)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Client {} not found", id)))?;

    AuditService::record(
        &user,
        AuditAction::Update,
        "client",
        Some(client.id),
        json!({ "name": client.name }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": client })))
}

/// DELETE /api/clients/:id - soft delete
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let pool = database::pool().await?;
    let client = sqlx::query_as::<_, Client>(
        "UPDATE clients SET deleted_at = $2 \
         WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(id)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::not_found(format!("Client {} not found", id)))?;

    AuditService::record(
        &user,
        AuditAction::Delete,
        "client",
        Some(client.id),
        json!({ "name": client.name }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": client })))
}

// Child collections. Each lives under /api/clients/:id/<collection>; deletes
// address the child row directly.

/// GET /api/clients/:id/legal-entities
pub async fn list_legal_entities(Path(client_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    list_children::<ClientLegalEntity>("client_legal_entities", client_id).await
}

/// GET /api/clients/:id/contracts
pub async fn list_contracts(Path(client_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    list_children::<ClientContract>("client_contracts", client_id).await
}

/// GET /api/clients/:id/contacts
pub async fn list_contacts(Path(client_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    list_children::<ClientContact>("client_contacts", client_id).await
}

/// GET /api/clients/:id/garage
pub async fn list_vehicles(Path(client_id): Path<Uuid>) -> Result<Json<Value>, ApiError> {
    list_children::<ClientVehicle>("client_vehicles", client_id).await
}

async fn list_children<T>(table: &str, client_id: Uuid) -> Result<Json<Value>, ApiError>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + serde::Serialize + Send + Unpin,
{
    fetch_client(client_id).await?;
    let pool = database::pool().await?;
    let sql = format!(
        "SELECT * FROM \"{}\" WHERE client_id = $1 AND deleted_at IS NULL ORDER BY created_at",
        table
    );
    let rows = sqlx::query_as::<_, T>(&sql)
        .bind(client_id)
        .fetch_all(pool)
        .await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

#[derive(Debug, Deserialize)]
pub struct CreateLegalEntityRequest {
    pub legal_name: String,
    pub inn: String,
    #[serde(default)]
    pub ogrn: String,
    #[serde(default)]
    pub address: String,
}

/// POST /api/clients/:id/legal-entities
pub async fn create_legal_entity(
    Extension(user): Extension<AuthUser>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<CreateLegalEntityRequest>,
) -> Result<Json<Value>, ApiError> {
    fetch_client(client_id).await?;
    if payload.legal_name.trim().is_empty() || payload.inn.trim().is_empty() {
        return Err(ApiError::validation_error(
            "legal_name and inn are required",
            None,
        ));
    }

    let pool = database::pool().await?;
    let entity = sqlx::query_as::<_, ClientLegalEntity>(
        "INSERT INTO client_legal_entities (id, client_id, legal_name, inn, ogrn, address) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(payload.legal_name.trim())
    .bind(payload.inn.trim())
    .bind(&payload.ogrn)
    .bind(&payload.address)
    .fetch_one(pool)
    .await?;

    AuditService::record(
        &user,
        AuditAction::Create,
        "client_legal_entity",
        Some(entity.id),
        json!({ "client_id": client_id, "legal_name": entity.legal_name }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": entity })))
}

/// DELETE /api/clients/:id/legal-entities/:child_id
pub async fn delete_legal_entity(
    Extension(user): Extension<AuthUser>,
    Path((client_id, child_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let entity: ClientLegalEntity =
        soft_delete_child("client_legal_entities", client_id, child_id).await?;

    AuditService::record(
        &user,
        AuditAction::Delete,
        "client_legal_entity",
        Some(child_id),
        json!({ "client_id": client_id }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": entity })))
}

#[derive(Debug, Deserialize)]
pub struct CreateContractRequest {
    pub number: String,
    pub signed_on: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    #[serde(default = "default_contract_status")]
    pub status: String,
}

fn default_contract_status() -> String {
    "active".to_string()
}

/// POST /api/clients/:id/contracts
pub async fn create_contract(
    Extension(user): Extension<AuthUser>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<CreateContractRequest>,
) -> Result<Json<Value>, ApiError> {
    fetch_client(client_id).await?;
    if payload.number.trim().is_empty() {
        return Err(ApiError::validation_error("Contract number is required", None));
    }
    if !CONTRACT_STATUSES.contains(&payload.status.as_str()) {
        return Err(ApiError::bad_request(format!(
            "Unknown contract status '{}', expected one of: {}",
            payload.status,
            CONTRACT_STATUSES.join(", ")
        )));
    }

    let pool = database::pool().await?;
    let contract = sqlx::query_as::<_, ClientContract>(
        "INSERT INTO client_contracts (id, client_id, number, signed_on, valid_until, status) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(payload.number.trim())
    .bind(payload.signed_on)
    .bind(payload.valid_until)
    .bind(&payload.status)
    .fetch_one(pool)
    .await?;

    AuditService::record(
        &user,
        AuditAction::Create,
        "client_contract",
        Some(contract.id),
        json!({ "client_id": client_id, "number": contract.number }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": contract })))
}

/// DELETE /api/clients/:id/contracts/:child_id
pub async fn delete_contract(
    Extension(user): Extension<AuthUser>,
    Path((client_id, child_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let contract: ClientContract =
        soft_delete_child("client_contracts", client_id, child_id).await?;

    AuditService::record(
        &user,
        AuditAction::Delete,
        "client_contract",
        Some(child_id),
        json!({ "client_id": client_id }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": contract })))
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// POST /api/clients/:id/contacts
pub async fn create_contact(
    Extension(user): Extension<AuthUser>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<CreateContactRequest>,
) -> Result<Json<Value>, ApiError> {
    fetch_client(client_id).await?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation_error("Contact name is required", None));
    }

    let pool = database::pool().await?;
    let contact = sqlx::query_as::<_, ClientContact>(
        "INSERT INTO client_contacts (id, client_id, name, role, phone, email) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(payload.name.trim())
    .bind(&payload.role)
    .bind(&payload.phone)
    .bind(&payload.email)
    .fetch_one(pool)
    .await?;

    AuditService::record(
        &user,
        AuditAction::Create,
        "client_contact",
        Some(contact.id),
        json!({ "client_id": client_id, "name": contact.name }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": contact })))
}

/// DELETE /api/clients/:id/contacts/:child_id
pub async fn delete_contact(
    Extension(user): Extension<AuthUser>,
    Path((client_id, child_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let contact: ClientContact =
        soft_delete_child("client_contacts", client_id, child_id).await?;

    AuditService::record(
        &user,
        AuditAction::Delete,
        "client_contact",
        Some(child_id),
        json!({ "client_id": client_id }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": contact })))
}

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: Option<String>,
    pub plate: Option<String>,
}

/// POST /api/clients/:id/garage
pub async fn create_vehicle(
    Extension(user): Extension<AuthUser>,
    Path(client_id): Path<Uuid>,
    Json(payload): Json<CreateVehicleRequest>,
) -> Result<Json<Value>, ApiError> {
    fetch_client(client_id).await?;
    if payload.make.trim().is_empty() || payload.model.trim().is_empty() {
        return Err(ApiError::validation_error("make and model are required", None));
    }
    if !(1900..=2100).contains(&payload.year) {
        return Err(ApiError::validation_error(
            "Year is out of range",
            Some([("year".to_string(), "must be 1900-2100".to_string())].into()),
        ));
    }

    let pool = database::pool().await?;
    let vehicle = sqlx::query_as::<_, ClientVehicle>(
        "INSERT INTO client_vehicles (id, client_id, make, model, year, vin, plate) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(client_id)
    .bind(payload.make.trim())
    .bind(payload.model.trim())
    .bind(payload.year)
    .bind(payload.vin.as_deref())
    .bind(payload.plate.as_deref())
    .fetch_one(pool)
    .await?;

    AuditService::record(
        &user,
        AuditAction::Create,
        "client_vehicle",
        Some(vehicle.id),
        json!({ "client_id": client_id, "make": vehicle.make, "model": vehicle.model }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": vehicle })))
}

/// DELETE /api/clients/:id/garage/:child_id
pub async fn delete_vehicle(
    Extension(user): Extension<AuthUser>,
    Path((client_id, child_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let vehicle: ClientVehicle =
        soft_delete_child("client_vehicles", client_id, child_id).await?;

    AuditService::record(
        &user,
        AuditAction::Delete,
        "client_vehicle",
        Some(child_id),
        json!({ "client_id": client_id }),
    )
    .await;

    Ok(Json(json!({ "success": true, "data": vehicle })))
}

async fn fetch_client(id: Uuid) -> Result<Client, ApiError> {
    let pool = database::pool().await?;
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Client {} not found", id)))
}

async fn soft_delete_child<T>(table: &str, client_id: Uuid, child_id: Uuid) -> Result<T, ApiError>
where
    T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
    let pool = database::pool().await?;
    let sql = format!(
        "UPDATE \"{}\" SET deleted_at = $3 \
         WHERE id = $1 AND client_id = $2 AND deleted_at IS NULL RETURNING *",
        table
    );
    sqlx::query_as::<_, T>(&sql)
        .bind(child_id)
        .bind(client_id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("Record {} not found for client {}", child_id, client_id))
        })
}

fn validate_profile(profile: &str) -> Result<(), ApiError> {
    if PROFILES.contains(&profile) {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "Unknown profile '{}', expected one of: {}",
            profile,
            PROFILES.join(", ")
        )))
    }
}

fn validate_discount(discount: Decimal) -> Result<(), ApiError> {
    if discount < Decimal::ZERO || discount > Decimal::from(100) {
        Err(ApiError::validation_error(
            "Discount must be between 0 and 100 percent",
            Some([("discount_pct".to_string(), "out of range".to_string())].into()),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_validation() {
        assert!(validate_profile("retail").is_ok());
        assert!(validate_profile("wholesale").is_ok());
        assert!(validate_profile("legal_entity").is_ok());
        assert!(validate_profile("vip").is_err());
    }

    #[test]
    fn discount_bounds() {
        assert!(validate_discount(Decimal::ZERO).is_ok());
        assert!(validate_discount(Decimal::from(100)).is_ok());
        assert!(validate_discount(Decimal::from(101)).is_err());
        assert!(validate_discount(Decimal::from(-1)).is_err());
    }
}
