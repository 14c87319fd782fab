pub mod qr;

pub use qr::{decode, encode};
