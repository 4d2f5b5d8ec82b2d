pub mod file_service;
pub mod local_store;
pub mod remote;
pub mod staging;
