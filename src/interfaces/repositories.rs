pub mod education_api;
pub mod local_cache;
