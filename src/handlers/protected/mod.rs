pub mod account;
pub mod audit;
pub mod clients;
pub mod find;
pub mod media;
pub mod pages;
pub mod sections;
