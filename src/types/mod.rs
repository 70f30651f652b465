pub mod listener;
pub mod resource;

pub use listener::{Change, ChangeType, Listener};
pub use resource::{AuxListRow, Resource, ResourceTypeSchema, SubpathSchema};
