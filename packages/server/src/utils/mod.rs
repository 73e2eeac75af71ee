pub mod csrf;
pub mod filename;
pub mod flash;
pub mod hash;
pub mod jwt;
pub mod markdown;
