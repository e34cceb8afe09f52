pub mod catalog;
pub mod draft;
pub mod enums;

pub use catalog::*;
pub use draft::*;
pub use enums::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Catalog record has no usable id")]
    MissingId,

    #[error("Catalog record {id} has no category reference")]
    MissingCategory { id: String },

    #[error("Catalog record {id} has no display name")]
    MissingName { id: String },
}
