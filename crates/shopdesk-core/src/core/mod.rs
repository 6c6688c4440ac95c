pub mod actions;
pub mod app_context;
pub mod auth;
pub mod debounce;
pub mod feedback;
pub mod forms;
pub mod list;
pub mod resource;
