pub mod purchases;
pub mod raffles;

pub use purchases as purchase_entity;
pub use raffles as raffle_entity;
pub use raffles::RaffleStatus;
