mod audit;
mod batch;

pub use audit::*;
pub use batch::*;
