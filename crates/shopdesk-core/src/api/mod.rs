pub mod client;
pub mod envelope;
pub mod models;
pub mod resources;
