//! Kinetic Services
//!
//! External boundaries of the landing page:
//!
//! - **Prediction**: submits nine named vitals to the prediction service with
//!   a request timeout and bounded retry
//! - **Identity**: authenticated flag plus the sign-in / sign-up actions
//!
//! The animation engine never depends on these; the CLI wires them in.

pub mod error;
pub mod identity;
pub mod prediction;

pub use error::{IdentityError, PredictionError, Result};
pub use identity::{available_actions, AuthAction, IdentityProvider, StaticIdentity};
pub use prediction::{
    HttpTransport, PredictionClient, PredictionRecord, PredictionResponse, PredictionTransport,
    RetryPolicy, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT,
};
