mod element;
mod formula;
mod mass_range;
mod residue;

pub use element::*;
pub use formula::*;
pub use mass_range::*;
pub use residue::*;
