pub mod common;
pub mod stages;
