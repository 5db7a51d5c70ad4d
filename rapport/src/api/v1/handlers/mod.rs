pub(crate) mod health;
pub mod relationships;

pub use health::health_check;
