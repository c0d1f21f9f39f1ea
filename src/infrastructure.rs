pub mod storage;
pub mod http;
