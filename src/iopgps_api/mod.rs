pub mod cached_iopgps_client;
pub mod iopgps_client;
pub mod models;
