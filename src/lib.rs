//! Wardrobe Wizard backend: accounts, a photographed clothing closet and
//! AI-suggested outfits over a JSON HTTP API.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::configure_routes;
