pub mod models;
pub mod pin;
pub mod repository;

pub use models::{User, UserStatus};
pub use pin::PinVerifier;
pub use repository::UserRepository;
