//! Error types for Kiln
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Kiln 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 네임스페이스 / 레지스트리 관련
    // ========================================================================
    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    // ========================================================================
    // 전송 관련 (fetch 실패는 재시도 없이 치명적)
    // ========================================================================
    #[error("Transfer failed for namespace '{namespace}': {reason}")]
    Transfer { namespace: String, reason: String },

    #[error("Unsupported resource kind: {0}")]
    UnsupportedResource(String),

    // ========================================================================
    // 클래스 엔진 관련
    // ========================================================================
    #[error("Class error: {0}")]
    Class(String),

    #[error("No such member: {0}")]
    MemberNotFound(String),

    #[error("No base implementation for: {0}")]
    NoBaseImplementation(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 복구 불가능한 에러인지 확인 (fatal sink 대상)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Transfer { .. } | Error::UnsupportedResource(_)
        )
    }

    /// Transfer 에러 생성 헬퍼
    pub fn transfer(namespace: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Transfer {
            namespace: namespace.into(),
            reason: reason.into(),
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_is_fatal() {
        let err = Error::transfer("app.screen.Home", "connection refused");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("app.screen.Home"));
    }

    #[test]
    fn test_class_error_not_fatal() {
        assert!(!Error::Class("bad member".into()).is_fatal());
        assert!(!Error::Config("missing base url".into()).is_fatal());
    }
}
