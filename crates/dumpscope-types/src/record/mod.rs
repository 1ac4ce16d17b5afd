pub mod diagnostic;
pub mod kind;
pub mod payload;

pub use diagnostic::*;
pub use kind::*;
pub use payload::*;
