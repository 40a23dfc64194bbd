// Library exports for Instrevi
// The binary, the client and the integration tests all build on these modules

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod profile;
pub mod reviews;
pub mod routes;
pub mod state;
pub mod users;
