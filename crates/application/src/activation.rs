/// Terminal status reported by one create or sweep activation.
///
/// Activations report failures instead of propagating them to the
/// scheduler or request handler that triggered them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationStatus {
    /// Whether the activation reached its goal.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl ActivationStatus {
    /// Creates a successful status.
    #[must_use]
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates a failed status.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
