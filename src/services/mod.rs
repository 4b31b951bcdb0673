//! Business services layer.
//!
//! Services sit between the binary and the infrastructure layer:
//!
//! ```text
//!      main.rs (logging, settings, polling)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Digest core + Mailbox provider
//! ```
//!
//! - [`RelayService`]: Runs relay passes over the digests in a mailbox

mod relay_service;

pub use relay_service::{RelayReport, RelayService};
