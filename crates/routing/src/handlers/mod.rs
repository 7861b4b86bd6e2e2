//! HTTP handlers for the FHIR interactions.

pub mod export;
pub mod history;
pub mod read;
pub mod search;
pub mod transaction;
pub mod vread;

pub use export::{cancel_export_handler, export_handler, export_status_handler};
pub use history::{history_instance_handler, history_system_handler, history_type_handler};
pub use read::read_handler;
pub use search::{search_system_handler, search_type_handler};
pub use transaction::transaction_handler;
pub use vread::vread_handler;
