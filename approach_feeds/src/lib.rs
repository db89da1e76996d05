pub mod endpoints;
pub mod error;
pub mod flight;
pub mod response;
pub mod runway;
pub mod weather;
