pub mod account_tracker;
pub mod tracked_device;
