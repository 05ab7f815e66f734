// Handlers module

pub mod errors;
pub mod models;
pub mod optimize;
pub mod query;
pub mod status;

pub use errors::handle_rejection;
pub use models::{health_handler, list_models_handler};
pub use optimize::optimize_handler;
pub use query::{chat_handler, submit_query_handler};
pub use status::{get_result_handler, get_status_handler, status_events_handler};
