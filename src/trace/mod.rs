pub mod logger;
pub mod record;
