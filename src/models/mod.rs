pub mod models;
pub mod status;

// Re-export commonly used types
pub use models::AppState;
pub use status::{FulfillmentType, PaymentStatus, PhoneStatus};
