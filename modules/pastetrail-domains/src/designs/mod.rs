pub mod models;

pub use models::design::{Design, DesignWithCreator};
