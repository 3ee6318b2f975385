pub mod auth;
pub mod health;
pub mod plans;
pub mod superadmin;
pub mod uploads;
pub mod weddings;
