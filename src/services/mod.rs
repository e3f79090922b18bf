pub mod access_urls;
pub mod storage_service;
pub mod usage;
