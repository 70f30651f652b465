pub mod prototype;
pub mod registry;

pub use registry::SchemaRegistry;
