pub mod common;
pub mod purchase;
pub mod raffle;

pub use common::*;
pub use purchase::*;
pub use raffle::*;
