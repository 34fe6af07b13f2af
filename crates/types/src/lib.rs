pub mod category;
pub mod descriptor;
pub mod point;

pub use category::*;
pub use descriptor::*;
pub use point::*;
