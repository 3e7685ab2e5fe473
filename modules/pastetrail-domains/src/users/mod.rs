pub mod models;
pub mod password;

pub use models::user::User;
pub use password::{hash_password, verify_password};
