//! Request client subsystem.
//!
//! # Data Flow
//! ```text
//! caller → RequestClient::request(url, options)
//!     → cache lookup (hit: return, no network, no limiter)
//!     → rate limiter acquire (suspends this request only)
//!     → transport with timeout/retry/cancellation
//!     → decode by content type
//!     → cache store (idempotent + success only)
//!     → hook dispatch
//!     → caller
//! ```

pub mod cancel;
pub mod decode;
pub mod hooks;
pub mod options;
pub mod request;
pub mod transport;
pub mod types;

pub use cancel::CancelToken;
pub use decode::{ContentKind, DatasetFormat, DecodedBody};
pub use hooks::Hooks;
pub use options::{HttpResponse, PreparedRequest, RequestOptions};
pub use request::RequestClient;
pub use transport::{RawResponse, ReqwestTransport, Transport, TransportError, TransportRequest};
pub use types::{ErrorKind, FetchError, FetchResult};
