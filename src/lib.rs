#[cfg(feature = "chrome")]
pub mod browser;
pub mod composite;
pub mod core;
pub mod dom;
pub mod errors;
pub mod generator;
pub mod heal;
pub mod locator;
pub mod scanner;
pub mod selector;
pub mod testing;
pub mod types;
pub mod validator;

#[cfg(feature = "chrome")]
pub use browser::ChromeDocument;
pub use composite::CompositeLocator;
pub use crate::core::{DocumentQuery, LocatorConfig, RelationOptions};
pub use dom::StaticDocument;
pub use errors::{LocatorError, Result};
pub use locator::{SmartLocator, StrategyReport};
pub use selector::Query;
pub use types::*;
