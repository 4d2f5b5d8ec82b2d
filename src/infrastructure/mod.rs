pub mod local;
pub mod storage;
