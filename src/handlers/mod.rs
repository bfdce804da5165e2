pub mod auth;
pub mod clothing;
pub mod file;
pub mod outfit;
pub mod profile;
