pub mod audit;
pub mod catalog;
pub mod client;
pub mod media;
pub mod page;
pub mod user;

pub use audit::{AuditAction, AuditEntry};
pub use catalog::{Category, Product};
pub use client::{Client, ClientContact, ClientContract, ClientLegalEntity, ClientVehicle};
pub use media::MediaAsset;
pub use page::{Page, PageSection};
pub use user::User;
