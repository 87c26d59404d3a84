pub mod location_api;
