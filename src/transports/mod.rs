//! Mail transport implementations.
//!
//! Each transport implements the [`Transport`](crate::Transport) trait.
//!
//! | Transport | Feature Flag | Description |
//! |-----------|--------------|-------------|
//! | [`SmtpTransport`] | `smtp` | SMTP relay via lettre |
//! | [`LocalTransport`] | (none) | In-memory capture for dev/testing |
//! | [`LoggerTransport`] | (none) | Logs messages without sending |

#[cfg(feature = "smtp")]
mod smtp;
#[cfg(feature = "smtp")]
pub use smtp::{SmtpBuilder, SmtpTransport, TlsMode};

mod local;
pub use local::{LocalTransport, SentMessage};

mod logger;
pub use logger::LoggerTransport;
