pub mod device;
pub mod error;
pub mod location_record;
