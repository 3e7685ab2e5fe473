pub mod models;

pub use models::sticker::{Sticker, StickerDetail};
