//! Bootstrap Loader - 고정 목록에 대한 one-shot fixed-point 스케줄러
//!
//! 레지스트리와 독립적으로, 프로세스 시작 시 한 번 실행되어 startup 리소스
//! 그래프를 `dependsOn` 순서대로 로드합니다. 의존성이 모두 완료된 태스크만
//! 구체화되고, 각 완료가 재스캔을 일으켜 새로 풀린 의존 태스크가 곧바로
//! 출발합니다.
//!
//! 부트스트랩 fetch에는 타임아웃이 없습니다. 완료가 끝내 도착하지 않는
//! 리소스는 자신에게 의존하는 모든 태스크를 무기한 정지시킵니다 - 이는
//! 의도된 동작 경계입니다.

pub mod task;

pub use task::{platform_manifest, ResourceLoadTask, KIND_SCRIPT, KIND_STYLESHEET};

use crate::loader::Transport;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use kiln_foundation::{report_fatal, Error, FatalReport, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

type FetchFuture = BoxFuture<'static, (ResourceLoadTask, TaskKind, Result<String>)>;

// ============================================================================
// Sink / Observer - 구체화 부작용과 진행률은 consumer가 정의
// ============================================================================

/// Materialization side effects, dispatched by task kind.
pub trait BootstrapSink: Send + Sync {
    fn install_script(&self, _id: &str, _source: &str) -> Result<()> {
        Ok(())
    }

    fn install_stylesheet(&self, _id: &str, _source: &str) -> Result<()> {
        Ok(())
    }
}

/// Sink that discards everything.
pub struct NullSink;

impl BootstrapSink for NullSink {}

/// Progress notifications. `percent` is monotonic, rounded to two decimals.
pub trait BootstrapObserver: Send + Sync {
    fn on_resource_loaded(&self, _id: &str, _percent: f64) {}
}

// ============================================================================
// 내부 상태
// ============================================================================

/// Validated task kinds. Parsed when a task is scheduled.
#[derive(Debug, Clone, Copy)]
enum TaskKind {
    Script,
    Stylesheet,
}

impl TaskKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            KIND_SCRIPT => Some(Self::Script),
            KIND_STYLESHEET => Some(Self::Stylesheet),
            _ => None,
        }
    }
}

/// Grow-only scheduling state of one run. `added` and `loaded` never shrink
/// within a run; the whole struct is discarded when the run completes.
#[derive(Default)]
struct ResourceStatus {
    added: Vec<String>,
    loaded: Vec<String>,
}

/// What a bootstrap run accomplished.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub total: usize,

    /// Completed ids, in completion order.
    pub loaded: Vec<String>,

    /// Ids that could never be scheduled (an unsatisfiable `dependsOn`).
    pub pending: Vec<String>,
}

impl BootstrapReport {
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

// ============================================================================
// BootstrapLoader
// ============================================================================

/// One-shot dependency-ordered loader over a fixed task list.
pub struct BootstrapLoader {
    transport: Arc<dyn Transport>,
    sink: Arc<dyn BootstrapSink>,
    observer: Option<Arc<dyn BootstrapObserver>>,
}

impl BootstrapLoader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sink: Arc::new(NullSink),
            observer: None,
        }
    }

    /// 빌더 패턴: sink 설정
    pub fn with_sink(mut self, sink: Arc<dyn BootstrapSink>) -> Self {
        self.sink = sink;
        self
    }

    /// 빌더 패턴: observer 설정
    pub fn with_observer(mut self, observer: Arc<dyn BootstrapObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run to the fixed point. Terminates implicitly: the run is over when a
    /// scan pass schedules nothing new and every in-flight fetch has settled.
    pub async fn run(&self, tasks: &[ResourceLoadTask]) -> Result<BootstrapReport> {
        let total = tasks.len();
        let mut status = ResourceStatus::default();
        let mut inflight: FuturesUnordered<FetchFuture> = FuturesUnordered::new();

        self.scan(tasks, &mut status, &mut inflight)?;

        while let Some((task, kind, fetched)) = inflight.next().await {
            let source = match fetched {
                Ok(source) => source,
                Err(cause) => {
                    let error = Error::transfer(&task.id, cause.to_string());
                    report_fatal(FatalReport::new("bootstrap", error.to_string()));
                    return Err(error);
                }
            };

            match kind {
                TaskKind::Script => self.sink.install_script(&task.id, &source)?,
                TaskKind::Stylesheet => self.sink.install_stylesheet(&task.id, &source)?,
            }

            status.loaded.push(task.id.clone());
            let percent = Self::percent(status.loaded.len(), total);
            info!(id = %task.id, percent, "bootstrap resource loaded");
            if let Some(observer) = &self.observer {
                observer.on_resource_loaded(&task.id, percent);
            }

            // a completion may have unlocked dependents
            self.scan(tasks, &mut status, &mut inflight)?;
        }

        let pending: Vec<String> = tasks
            .iter()
            .filter(|task| !status.loaded.contains(&task.id))
            .map(|task| task.id.clone())
            .collect();
        if !pending.is_empty() {
            warn!(?pending, "bootstrap finished with unschedulable tasks");
        }

        Ok(BootstrapReport {
            total,
            loaded: status.loaded,
            pending,
        })
    }

    /// One scan pass: schedule every task whose dependencies are all loaded.
    /// A task is marked `added` before its fetch is issued, so a rescan
    /// triggered by a completion can never schedule it twice.
    fn scan(
        &self,
        tasks: &[ResourceLoadTask],
        status: &mut ResourceStatus,
        inflight: &mut FuturesUnordered<FetchFuture>,
    ) -> Result<()> {
        for task in tasks {
            if status.added.contains(&task.id) {
                continue;
            }
            if !task
                .depends_on
                .iter()
                .all(|dep| status.loaded.contains(dep))
            {
                continue;
            }

            let Some(kind) = TaskKind::parse(&task.kind) else {
                let error = Error::UnsupportedResource(format!("'{}' for task '{}'", task.kind, task.id));
                report_fatal(FatalReport::new("bootstrap", error.to_string()));
                return Err(error);
            };

            status.added.push(task.id.clone());
            debug!(id = %task.id, location = %task.source_location, "materializing");

            let transport = Arc::clone(&self.transport);
            let task = task.clone();
            inflight.push(Box::pin(async move {
                let fetched = transport.fetch(&task.source_location).await;
                (task, kind, fetched)
            }));
        }
        Ok(())
    }

    fn percent(loaded: usize, total: usize) -> f64 {
        if total == 0 {
            return 100.0;
        }
        let raw = loaded as f64 / total as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    }
}
