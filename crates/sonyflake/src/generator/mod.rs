mod interface;
mod round_robin;
mod sonyflake;
mod state;
#[cfg(test)]
mod tests;

pub use interface::*;
pub use round_robin::*;
pub use sonyflake::*;
