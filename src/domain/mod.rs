pub mod diff;
pub mod entities;
