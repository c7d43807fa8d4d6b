pub mod error;
pub mod ports;
pub mod registry;
pub mod types;

pub use error::{AdaptationError, AdaptationErrorKind};
pub use ports::{Adapts, Construct, Factory, infer};
pub use registry::AdaptationRegistry;
pub use types::{AdaptationConfig, AdaptationKey, Converter, TieBreak};
