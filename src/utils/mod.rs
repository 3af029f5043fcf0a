pub mod date;
pub mod input;
pub mod jwt;

pub use date::parse_draw_date;
pub use input::{optional_text, required_text};
pub use jwt::*;
