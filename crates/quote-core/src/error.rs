//! 시세 시스템의 에러 타입.

use thiserror::Error;

/// 핵심 시세 에러.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 시세 작업을 위한 Result 타입.
pub type QuoteResult<T> = Result<T, QuoteError>;

impl QuoteError {
    /// 클라이언트 요청 문제로 인한 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QuoteError::InvalidInput(_))
    }
}

impl From<serde_json::Error> for QuoteError {
    fn from(err: serde_json::Error) -> Self {
        QuoteError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for QuoteError {
    fn from(err: config::ConfigError) -> Self {
        QuoteError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error() {
        assert!(QuoteError::InvalidInput("empty".to_string()).is_client_error());
        assert!(!QuoteError::Config("bad".to_string()).is_client_error());
    }
}
