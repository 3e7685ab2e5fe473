pub mod models;

pub use models::sighting::{Sighting, SightingWithDesign};
