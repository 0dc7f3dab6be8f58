pub mod request_id;
pub mod static_assets;
