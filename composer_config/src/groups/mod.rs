pub mod log;
pub mod upload;
