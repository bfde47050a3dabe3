pub mod notifier;
pub mod sheets;
