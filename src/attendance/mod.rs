pub mod duration;
pub mod toggle;
