mod locks;
mod relationships;

pub use locks::KeyedLocks;
pub use relationships::{ContactDetail, RelationshipService};
