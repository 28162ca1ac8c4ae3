pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod oauth;
pub mod presentation;
pub mod session;
pub mod verifier;

pub use config::RelayConfig;
pub use engine::{ContactForm, ContactRelay, FlowOutcome};
pub use error::{DeliveryError, ValidationError};
pub use models::{Notice, Proof, SubmissionPayload, SubmissionStatus, VerificationResult};
pub use verifier::{TokenVerifier, TurnstileVerifier};
