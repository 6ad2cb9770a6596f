//! Client core for the OneSignal push-notification REST API.
//!
//! # Overview
//! Validates caller input, maps it to the provider's wire format, builds
//! `HttpRequest` values and parses `HttpResponse` values. The I/O itself sits
//! behind the `Transport` trait, so the core stays deterministic and testable.
//!
//! # Design
//! - `OneSignalClient` is stateless: base URL plus credentials checked at
//!   construction. Each operation is split into `build_*` (produces request)
//!   and `parse_*` (consumes response), so the I/O boundary is explicit.
//! - `OneSignal<T: Transport>` runs build, send and parse for each operation.
//! - Validation is declarative (`validation::Schema`) and always runs before
//!   a request exists.
//! - Successful replies pass through as `ApiResponse`; failures map onto
//!   `ApiError`, carrying the provider's `errors` body when there is one.
//!
//! ```no_run
//! use onesignal_core::{Credentials, OneSignal};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), onesignal_core::ApiError> {
//! let api = OneSignal::connect(Credentials::from_env())?;
//! let reply = api.send_notification(
//!     &json!({"en": "Your order shipped", "es": "Tu pedido fue enviado"}),
//!     Some(&json!({"targets": {"to": {"type": "externals", "value": ["customer-17"]}}})),
//! )?;
//! println!("created {}", reply.body["id"]);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod mapper;
pub mod transport;
pub mod types;
pub mod validation;

pub use api::OneSignal;
pub use client::{OneSignalClient, DEFAULT_BASE_URL};
pub use error::{ApiError, ProviderError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportError};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{ApiResponse, Credentials, LocalizedText, Message, TargetKind, TargetSelection, Targets};
pub use validation::ValidationError;
