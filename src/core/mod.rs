pub mod codec;
pub mod keys;
pub mod types;
