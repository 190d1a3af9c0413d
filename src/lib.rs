pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use errors::{NotifyError, NotifyResult};
pub use models::{CargoRequest, DispatchResult};
pub use services::dispatcher::NotificationDispatcher;
