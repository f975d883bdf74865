pub mod auth;
pub mod cli;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod filter;
pub mod graphql;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod services;
