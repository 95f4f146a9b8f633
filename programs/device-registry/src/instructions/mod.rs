pub mod registry;
pub mod device;

pub use registry::*;
pub use device::*;
