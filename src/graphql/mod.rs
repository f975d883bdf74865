//! GraphQL surface for the catalog (categories and products).

pub mod catalog;

use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql::{EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::Extension;
use axum::response::{Html, IntoResponse};
use once_cell::sync::Lazy;

use crate::config::{self, Environment};
use crate::middleware::AuthUser;

pub use catalog::{MutationRoot, QueryRoot};

pub type CatalogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

static SCHEMA: Lazy<CatalogSchema> =
    Lazy::new(|| Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish());

pub fn schema() -> &'static CatalogSchema {
    &SCHEMA
}

/// POST /api/graphql
pub async fn graphql_handler(
    Extension(user): Extension<AuthUser>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    schema().execute(req.into_inner().data(user)).await.into()
}

/// GET /api/graphql - playground, development only
pub async fn graphql_playground() -> impl IntoResponse {
    if config::config().environment == Environment::Development {
        Html(playground_source(GraphQLPlaygroundConfig::new("/api/graphql"))).into_response()
    } else {
        crate::error::ApiError::not_found("Not found").into_response()
    }
}
