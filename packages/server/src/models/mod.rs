pub mod auth;
pub mod content;
pub mod photo;
pub mod post;
pub mod project;
pub mod shared;
