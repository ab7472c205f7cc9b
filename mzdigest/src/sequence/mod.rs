mod digest;
mod protease;
mod protein;

pub use digest::*;
pub use protease::*;
pub use protein::*;
