//! Application error type shared by the library and the `bcurves` binary.
//!
//! Exit-code convention:
//! - 2: invalid input or configuration
//! - 3: insufficient usable data
//! - 4: internal / data-model invariant violation

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Bad CLI flags, malformed files, unusable settings (exit code 2).
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Structurally valid input that does not contain enough data (exit code 3).
    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    /// Broken internal invariant; always indicates a bug upstream (exit code 4).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
