//! Data module - CSV loading, cleaning and typed records

mod cleaner;
mod loader;
mod record;

pub use cleaner::{CleanReport, DataCleaner};
pub use loader::DataLoader;
pub use record::{Record, Table};
