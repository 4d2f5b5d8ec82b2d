pub mod retry;
pub mod validation;
