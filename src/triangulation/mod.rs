pub mod factors;
pub mod linear;
pub mod refine;

pub use factors::*;
pub use linear::*;
pub use refine::*;
