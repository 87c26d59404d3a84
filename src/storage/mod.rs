pub mod codec;
pub mod csv_store;
