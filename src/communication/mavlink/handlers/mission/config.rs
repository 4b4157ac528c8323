//! Transfer timing configuration

/// Upload timing for one protocol session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// Abandon an upload after this long without an accepted item
    pub upload_timeout_ms: u32,
    /// Resend the outstanding item request after this long, plus the
    /// link's stream slowdown
    pub request_resend_ms: u32,
}

impl TransferConfig {
    pub const DEFAULT_UPLOAD_TIMEOUT_MS: u32 = 8_000;
    pub const DEFAULT_REQUEST_RESEND_MS: u32 = 1_000;
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            upload_timeout_ms: Self::DEFAULT_UPLOAD_TIMEOUT_MS,
            request_resend_ms: Self::DEFAULT_REQUEST_RESEND_MS,
        }
    }
}
