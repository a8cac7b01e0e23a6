//! Heal History (C3, §4.3): records per-`(element_label, url_pattern,
//! strategy)` success/failure outcomes feeding the Healer's learned
//! priors on reprobe.

mod errors;
mod history;
mod store;

pub use errors::HealHistoryError;
pub use history::HealHistory;
pub use store::{HealHistoryStore, HealKey, InMemoryHealHistoryStore};
