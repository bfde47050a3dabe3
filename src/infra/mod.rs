pub mod google;
pub mod import;
pub mod notify;
