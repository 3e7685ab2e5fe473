pub mod session;
pub mod submit;

pub use session::{
    CapturedPhoto, DesignChoice, LocationSource, LogSession, NewDesign, StickerChoice,
};
pub use submit::{submit, Submission};
