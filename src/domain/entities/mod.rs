pub mod change;
pub mod table;
