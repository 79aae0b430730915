pub mod availability;
pub mod device;
pub mod device_tracker;
pub mod sensor;
pub mod status;
pub mod topics;
