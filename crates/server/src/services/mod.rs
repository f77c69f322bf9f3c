//! Business services.
//!
//! Services orchestrate validation and repository calls; all persistence
//! is delegated to the repository layer.

pub mod users;

pub use users::{UserService, UserServiceError};
