pub mod designs;
pub mod geo;
pub mod logging;
pub mod matching;
pub mod photos;
pub mod search;
pub mod sightings;
pub mod stickers;
pub mod users;
