mod interface;
mod system;
mod ticks;

pub use interface::*;
pub use system::*;
pub use ticks::*;
