//! Retry policy for the proxy.
//!
//! ```text
//! failure → [classify] → Fatal            → give up
//!                      → RetryWithBackoff → sleep U(0,1)·(2^n − 1)·slot
//!                      → Reconnect        → reopen (or wait fixed interval)
//! ```

pub mod backoff;
pub mod classify;
pub mod hold;
pub mod retry;

pub use backoff::Backoff;
pub use classify::{classify, FailureAction};
pub use hold::HoldFlag;
pub use retry::RetryContext;
