pub mod request;
pub mod response;

pub mod auth_token;
pub mod device;
pub mod device_status;
pub mod location;
mod number_or_string;
