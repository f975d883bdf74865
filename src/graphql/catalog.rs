use async_graphql::{Context, InputObject, Object, Result, SimpleObject};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::database::models::{AuditAction, Category, Product};
use crate::database;
use crate::middleware::AuthUser;
use crate::services::AuditService;

#[derive(SimpleObject)]
pub struct CategoryNode {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub position: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryNode {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            slug: c.slug,
            name: c.name,
            parent_id: c.parent_id,
            position: c.position,
            updated_at: c.updated_at,
        }
    }
}

#[derive(SimpleObject)]
pub struct ProductNode {
    pub id: Uuid,
    pub category_id: Uuid,
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    pub stock: i32,
    pub attrs: async_graphql::Json<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductNode {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            category_id: p.category_id,
            sku: p.sku,
            name: p.name,
            brand: p.brand,
            price: p.price,
            stock: p.stock,
            attrs: async_graphql::Json(p.attrs),
            updated_at: p.updated_at,
        }
    }
}

#[derive(SimpleObject)]
pub struct ProductPage {
    pub items: Vec<ProductNode>,
    pub total: i64,
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All live categories in display order.
    async fn categories(&self) -> Result<Vec<CategoryNode>> {
        let pool = database::pool().await?;
        let rows = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE deleted_at IS NULL ORDER BY position, name",
        )
        .fetch_all(pool)
        .await
        .map_err(database::DbError::from)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn category(&self, id: Uuid) -> Result<Option<CategoryNode>> {
        let pool = database::pool().await?;
        let row = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(database::DbError::from)?;
        Ok(row.map(Into::into))
    }

    /// Product search with optional category and name/sku/brand matching.
    async fn products(
        &self,
        search: Option<String>,
        category_id: Option<Uuid>,
        #[graphql(default = 50)] limit: i32,
        #[graphql(default = 0)] offset: i32,
    ) -> Result<ProductPage> {
        let max = crate::config::config().filter.max_limit;
        let limit = limit.clamp(1, max);
        let offset = offset.max(0);
        let pattern = search.map(|s| format!("%{}%", s));

        let pool = database::pool().await?;
        let rows = sqlx::query_as::<_, Product>(
            "SELECT * FROM products \
             WHERE deleted_at IS NULL \
               AND ($1::uuid IS NULL OR category_id = $1) \
               AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2 OR brand ILIKE $2) \
             ORDER BY name LIMIT $3 OFFSET $4",
        )
        .bind(category_id)
        .bind(pattern.as_deref())
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(pool)
        .await
        .map_err(database::DbError::from)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products \
             WHERE deleted_at IS NULL \
               AND ($1::uuid IS NULL OR category_id = $1) \
               AND ($2::text IS NULL OR name ILIKE $2 OR sku ILIKE $2 OR brand ILIKE $2)",
        )
        .bind(category_id)
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await
        .map_err(database::DbError::from)?;

        Ok(ProductPage {
            items: rows.into_iter().map(Into::into).collect(),
            total,
        })
    }

    async fn product(&self, id: Uuid) -> Result<Option<ProductNode>> {
        let pool = database::pool().await?;
        let row = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(database::DbError::from)?;
        Ok(row.map(Into::into))
    }
}

#[derive(InputObject)]
pub struct CreateCategoryInput {
    pub slug: String,
    pub name: String,
    pub parent_id: Option<Uuid>,
    #[graphql(default = 0)]
    pub position: i32,
}

#[derive(InputObject)]
pub struct UpdateCategoryInput {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
    pub position: Option<i32>,
}

#[derive(InputObject)]
pub struct CreateProductInput {
    pub category_id: Uuid,
    pub sku: String,
    pub name: String,
    #[graphql(default)]
    pub brand: String,
    pub price: Decimal,
    #[graphql(default = 0)]
    pub stock: i32,
    pub attrs: Option<async_graphql::Json<serde_json::Value>>,
}

#[derive(InputObject)]
pub struct UpdateProductInput {
    pub category_id: Option<Uuid>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub attrs: Option<async_graphql::Json<serde_json::Value>>,
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_category(
        &self,
        ctx: &Context<'_>,
        input: CreateCategoryInput,
    ) -> Result<CategoryNode> {
        let user = ctx.data::<AuthUser>()?;
        if input.slug.trim().is_empty() || input.name.trim().is_empty() {
            return Err("slug and name are required".into());
        }

        let pool = database::pool().await?;
        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, slug, name, parent_id, position) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(input.slug.trim())
        .bind(input.name.trim())
        .bind(input.parent_id)
        .bind(input.position)
        .fetch_one(pool)
        .await
        .map_err(database::DbError::from)?;

        AuditService::record(
            user,
            AuditAction::Create,
            "category",
            Some(category.id),
            json!({ "slug": category.slug }),
        )
        .await;

        Ok(category.into())
    }

    async fn update_category(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<CategoryNode> {
        let user = ctx.data::<AuthUser>()?;
        let pool = database::pool().await?;
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET \
                slug = COALESCE($2, slug), \
                name = COALESCE($3, name), \
                parent_id = COALESCE($4, parent_id), \
                position = COALESCE($5, position), \
                updated_at = $6 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(input.slug.as_deref())
        .bind(input.name.as_deref())
        .bind(input.parent_id)
        .bind(input.position)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
        .map_err(database::DbError::from)?
        .ok_or_else(|| async_graphql::Error::new(format!("Category {} not found", id)))?;

        AuditService::record(
            user,
            AuditAction::Update,
            "category",
            Some(category.id),
            json!({ "slug": category.slug }),
        )
        .await;

        Ok(category.into())
    }

    async fn delete_category(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        let user = ctx.data::<AuthUser>()?;
        let pool = database::pool().await?;

        let live_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE category_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(database::DbError::from)?;
        if live_products > 0 {
            return Err(async_graphql::Error::new(format!(
                "Category has {} products, move or delete them first",
                live_products
            )));
        }

        let result = sqlx::query(
            "UPDATE categories SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(database::DbError::from)?;
        if result.rows_affected() == 0 {
            return Err(async_graphql::Error::new(format!("Category {} not found", id)));
        }

        AuditService::record(user, AuditAction::Delete, "category", Some(id), json!({})).await;
        Ok(true)
    }

    async fn create_product(
        &self,
        ctx: &Context<'_>,
        input: CreateProductInput,
    ) -> Result<ProductNode> {
        let user = ctx.data::<AuthUser>()?;
        if input.sku.trim().is_empty() || input.name.trim().is_empty() {
            return Err("sku and name are required".into());
        }
        if input.price < Decimal::ZERO {
            return Err("price cannot be negative".into());
        }
        if input.stock < 0 {
            return Err("stock cannot be negative".into());
        }

        let pool = database::pool().await?;
        let attrs = input.attrs.map(|j| j.0).unwrap_or_else(|| json!({}));
        let product = sqlx::query_as::<_, Product>(
            "INSERT INTO products (id, category_id, sku, name, brand, price, stock, attrs) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(input.category_id)
        .bind(input.sku.trim())
        .bind(input.name.trim())
        .bind(&input.brand)
        .bind(input.price)
        .bind(input.stock)
        .bind(attrs)
        .fetch_one(pool)
        .await
        .map_err(database::DbError::from)?;

        AuditService::record(
            user,
            AuditAction::Create,
            "product",
            Some(product.id),
            json!({ "sku": product.sku }),
        )
        .await;

        Ok(product.into())
    }

    async fn update_product(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<ProductNode> {
        let user = ctx.data::<AuthUser>()?;
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err("price cannot be negative".into());
            }
        }
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err("stock cannot be negative".into());
            }
        }

        let pool = database::pool().await?;
        let product = sqlx::query_as::<_, Product>(
            "UPDATE products SET \
                category_id = COALESCE($2, category_id), \
                sku = COALESCE($3, sku), \
                name = COALESCE($4, name), \
                brand = COALESCE($5, brand), \
                price = COALESCE($6, price), \
                stock = COALESCE($7, stock), \
                attrs = COALESCE($8, attrs), \
                updated_at = $9 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(input.sku.as_deref())
        .bind(input.name.as_deref())
        .bind(input.brand.as_deref())
        .bind(input.price)
        .bind(input.stock)
        .bind(input.attrs.map(|j| j.0))
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
        .map_err(database::DbError::from)?
        .ok_or_else(|| async_graphql::Error::new(format!("Product {} not found", id)))?;

        AuditService::record(
            user,
            AuditAction::Update,
            "product",
            Some(product.id),
            json!({ "sku": product.sku }),
        )
        .await;

        Ok(product.into())
    }

    async fn delete_product(&self, ctx: &Context<'_>, id: Uuid) -> Result<bool> {
        let user = ctx.data::<AuthUser>()?;
        let pool = database::pool().await?;
        let result = sqlx::query(
            "UPDATE products SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(database::DbError::from)?;
        if result.rows_affected() == 0 {
            return Err(async_graphql::Error::new(format!("Product {} not found", id)));
        }

        AuditService::record(user, AuditAction::Delete, "product", Some(id), json!({})).await;
        Ok(true)
    }
}
