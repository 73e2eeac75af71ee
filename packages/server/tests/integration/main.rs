mod auth;
mod common;
mod contact;
mod image_info;
mod photos;
mod posts;
