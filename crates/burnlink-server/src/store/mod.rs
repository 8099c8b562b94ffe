pub mod memory;
pub mod model;

pub use memory::{Store, StoreError};
pub use model::SecretRecord;
