pub mod actor;
pub mod request_logger;
