use thiserror::Error;

/// Failures the middleware stages report to clients.
///
/// Only two conditions ever leave the pipeline as errors; every other
/// missing or disallowed signal degrades silently. The HTTP mapping lives in
/// `middleware::error_handler`.
#[derive(Error, Debug)]
pub enum HttpwareError {
    /// The tenant resolver is configured as required and no source yielded
    /// a tenant id or slug.
    #[error("tenant context required")]
    TenantRequired,

    /// A handler panicked and the recovery stage caught it.
    ///
    /// `message` is logged server-side only.
    #[error("Internal Server Error")]
    Internal { message: String },
}

impl HttpwareError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Type alias for Result with HttpwareError
pub type HttpwareResult<T> = Result<T, HttpwareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_never_leaks_internal_detail() {
        let err = HttpwareError::internal("index out of bounds: the len is 0");
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn test_tenant_required_display() {
        assert_eq!(HttpwareError::TenantRequired.to_string(), "tenant context required");
    }
}
