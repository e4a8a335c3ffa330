//! Domain models and DTOs.

pub mod wastage;

pub use wastage::{
    DeleteResponse, NewWastage, UploadedImage, WastageInput, WastageResponse, WastageUpdate,
};
