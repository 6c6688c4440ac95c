pub mod error_helpers;
pub mod text;
pub mod validation;
