pub mod amounts;
pub mod dates;
pub mod retry;
