pub mod http;
pub mod report;
pub mod storage;
