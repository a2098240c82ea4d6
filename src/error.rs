//! Stable error codes shared by every error enum in the crate.
//!
//! Callers (the CLI in particular) print `error_code()` next to the message so
//! failures can be grepped without parsing display strings.

/// Machine-readable classification for an error value.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
