pub mod purchase_service;
pub mod raffle_service;

pub use purchase_service::*;
pub use raffle_service::*;
