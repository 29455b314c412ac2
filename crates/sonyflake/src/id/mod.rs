mod decomposed;
mod layout;

pub use decomposed::*;
pub use layout::*;
