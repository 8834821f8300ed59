//! Rule configuration data model.
//!
//! Two layers:
//! - [`RawRuleConfiguration`]: the persisted JSON/YAML shape, every field
//!   optional, checked by [`RawRuleConfiguration::check_format`]
//! - [`RuleConfiguration`]: the typed tree, a tagged union over
//!   Basic / Array / Composite nodes that can only be built from a
//!   well-formed raw document (or the checked constructors)

mod error;
mod group;
mod raw;
mod rule;

pub use error::*;
pub use group::*;
pub use raw::*;
pub use rule::*;

#[cfg(test)]
mod tests;
