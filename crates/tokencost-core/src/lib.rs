pub mod config;
pub mod cost;
pub mod debounce;
pub mod error;
#[cfg(feature = "network")]
pub mod fetch;
pub mod format;
pub mod input;
pub mod loader;
pub mod pricing;
pub mod session;

pub use config::CalculatorConfig;
pub use cost::{CostBreakdown, Period};
pub use error::{FormatError, Result, TcError};
pub use format::ResultBundle;
pub use pricing::{PricingCatalog, PricingRecord, RecordId};
pub use session::{Display, Hint, Session, SessionState, Slot};
