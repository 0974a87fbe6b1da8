pub mod curve;
pub mod dispatcher;
pub mod error;
pub mod issuer;
pub mod model;
pub mod worker;

pub use curve::RateCurve;
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, DispatchError};
pub use issuer::Issuer;
pub use model::{Config, Outcome, Pacing, UnitReport};
