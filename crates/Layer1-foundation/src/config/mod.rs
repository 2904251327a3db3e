//! Kiln Config - 통합 설정
//!
//! 리소스 로더와 부트스트랩이 공유하는 런타임 설정

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 설정 파일명
pub const KILN_CONFIG_FILE: &str = "kiln.toml";

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Kiln/0.1".to_string()
}

/// Kiln 통합 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KilnConfig {
    /// 리소스를 내려받을 기준 URL (예: "http://localhost:8080/")
    pub base_url: String,

    /// 요청 타임아웃 (초). 부트스트랩 fetch에는 적용되지 않음
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User-Agent 헤더
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// 부트스트랩 매니페스트 경로 (없으면 내장 기본 목록 사용)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_manifest: Option<PathBuf>,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            request_timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            bootstrap_manifest: None,
        }
    }
}

impl KilnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// TOML 파일에서 로드
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: KilnConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일로 저장
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("serialize failed: {e}")))?;
        std::fs::write(path.as_ref(), raw)?;
        Ok(())
    }

    /// 기본 검증: base_url은 비어있을 수 없고 http(s)여야 함
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base-url must not be empty".into()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "base-url must be http(s), got: {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// 빌더 패턴: base URL 설정
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// 빌더 패턴: 타임아웃 설정
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }
}
