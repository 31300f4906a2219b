pub mod context;
pub mod outcome;
pub mod request;
pub mod types;
