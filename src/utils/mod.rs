pub mod timezone;

pub use timezone::{display_now, to_display};
