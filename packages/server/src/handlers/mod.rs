pub mod auth;
pub mod contact;
pub mod flash;
pub mod image_info;
pub mod photo;
pub mod post;
pub mod project;
