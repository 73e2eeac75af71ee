pub mod photo;
pub mod post;
pub mod project;
pub mod user;
