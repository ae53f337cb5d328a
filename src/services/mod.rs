// src/services/mod.rs

//! Services talking to the outside world: page extraction and delivery.

pub mod extractor;
pub mod telegram;

pub use extractor::extract;
pub use telegram::{Notifier, TelegramNotifier, build_message};
