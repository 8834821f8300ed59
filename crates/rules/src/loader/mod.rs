//! Rule document sources.
//!
//! [`RuleSource`] is the seam the engine loads array element configs
//! through. [`RuleLoader`] reads JSON/YAML documents from a rules directory
//! with an optional `notify` watcher that evicts cached trees on change;
//! [`InMemoryRules`] keeps documents in a map.

mod core;
mod error;
mod format;
mod memory;
mod references;
mod source;
mod watcher;


pub use self::core::RuleLoader;
pub use self::error::{LoadError, LoadResult, LoadStatus, Result};
pub use self::format::DocumentFormat;
pub use self::memory::InMemoryRules;
pub use self::references::check_references;
pub use self::source::RuleSource;
