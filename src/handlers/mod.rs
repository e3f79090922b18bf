pub mod blob_handlers;
pub mod health_handlers;
pub mod object_handlers;
pub mod owner;
pub mod usage_handlers;
