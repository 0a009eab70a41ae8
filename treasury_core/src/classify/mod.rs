pub mod handler;
pub mod rules;
