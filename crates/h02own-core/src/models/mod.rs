//! Data models shared by the pipeline stages

mod device;
mod owntracks;
mod position;

pub use device::*;
pub use owntracks::*;
pub use position::*;
