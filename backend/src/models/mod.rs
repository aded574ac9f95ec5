pub mod calendar;
pub mod location;

pub use calendar::*;
pub use location::*;
