//! Cover images: admission of uploads as photos and cleanup of their files.

pub mod admission;

pub use admission::{
    CoverTarget, CoverUpload, admit_and_attach, admit_cover, attach_cover, delete_photo_files,
};
