//! Fatal sink - 전역 치명적 에러 수신처
//!
//! 복구 불가능한 에러(전송 실패, 알 수 없는 부트스트랩 리소스 등)는 이 sink를
//! 통해 표면화됩니다. UI 레이어가 sink를 설치해 가로챌 수 있으며, 코어는
//! 어떤 복구도 수행하지 않습니다.

use chrono::{DateTime, Utc};
use std::sync::{Arc, OnceLock};
use tracing::error;

/// 치명적 에러 리포트
#[derive(Debug, Clone)]
pub struct FatalReport {
    /// 에러를 발생시킨 컴포넌트 ("loader", "bootstrap" 등)
    pub source: String,

    /// 사용자에게 보여줄 메시지
    pub message: String,

    /// 발생 시각
    pub timestamp: DateTime<Utc>,
}

impl FatalReport {
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// 치명적 에러 수신 trait
///
/// UI 레이어가 구현하여 설치합니다 (마스크 표시, 프로세스 종료 등).
pub trait FatalSink: Send + Sync {
    fn on_fatal(&self, report: &FatalReport);
}

static FATAL_SINK: OnceLock<Arc<dyn FatalSink>> = OnceLock::new();

/// 전역 fatal sink 설치. 최초 1회만 유효하며, 이미 설치되어 있으면 false
pub fn install_fatal_sink(sink: Arc<dyn FatalSink>) -> bool {
    FATAL_SINK.set(sink).is_ok()
}

/// sink 설치 여부
pub fn fatal_sink_installed() -> bool {
    FATAL_SINK.get().is_some()
}

/// 치명적 에러 보고
///
/// 항상 error 레벨로 로깅하고, sink가 설치되어 있으면 전달합니다.
pub fn report_fatal(report: FatalReport) {
    error!(source = %report.source, "{}", report.message);
    if let Some(sink) = FATAL_SINK.get() {
        sink.on_fatal(&report);
    }
}
