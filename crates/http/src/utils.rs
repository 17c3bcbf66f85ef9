//! Utility macros used across the crate.

/// Returns early with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(value.iter().all(u8::is_ascii_digit), ParseError::invalid_content_length("not a number"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
