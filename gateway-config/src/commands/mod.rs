pub mod list_endpoints;
pub mod render;
