pub mod admin;
pub mod plan;
pub mod upload;
pub mod user;
pub mod wedding;
