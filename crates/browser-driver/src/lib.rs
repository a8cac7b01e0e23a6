//! The Browser Driver capability interface (C1, §4.1): a narrow trait
//! the rest of the engine depends on, implementable atop any real
//! browser-automation library. This crate defines the trait and ships a
//! deterministic [`mock::MockDriver`] the rest of the workspace's test
//! suites drive against.

mod driver;
mod errors;
pub mod mock;
mod types;

pub use driver::BrowserDriver;
pub use errors::DriverError;
pub use types::{ElementHandle, EvalResult, LoadState, Rect, RoleLocator, DOM_SKELETON_SCRIPT};
