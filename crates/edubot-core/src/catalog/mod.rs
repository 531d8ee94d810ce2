//! Course and FAQ catalog.
//!
//! - **CatalogStore** (`store`): owns the live snapshot and swaps it atomically
//! - **MySqlCatalog** (`mysql`): active rows from the `courses`/`faqs` tables
//! - **FileCatalog** (`file`): a YAML snapshot, used for seeding and local runs

pub mod file;
pub mod mysql;
pub mod store;

pub use file::FileCatalog;
pub use mysql::MySqlCatalog;
pub use store::CatalogStore;
