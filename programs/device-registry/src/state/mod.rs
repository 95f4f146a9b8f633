pub mod registry;
pub mod device;
pub mod events;

pub use registry::*;
pub use device::*;
pub use events::*;
