pub mod board;
pub mod core;
pub mod links;
pub mod records;
pub mod reports;
pub mod session;
