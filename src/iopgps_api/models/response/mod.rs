pub mod api_status;
pub mod auth_response;
pub mod device_detail_response;
pub mod devices_response;
