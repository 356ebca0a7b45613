pub mod address;
pub mod security;
pub mod uuid;
