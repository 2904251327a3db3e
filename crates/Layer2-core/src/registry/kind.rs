//! Resource Kind - 로드 가능한 리소스의 종류
//!
//! 각 kind는 URL 조립 규칙, 전송 형식, 그리고 선택적인 kind 레벨
//! lifecycle hook을 가집니다. 표준 카탈로그([`KindCatalog::standard`])는
//! 프로세스 시작 시 한 번 만들어지며 이후 불변입니다.

use super::{ClassRegistry, Namespace, Unit};
use kiln_foundation::Result;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// 표준 kind 이름
pub const KIND_CLASS: &str = "class";
pub const KIND_STYLE: &str = "style";
pub const KIND_TEMPLATE: &str = "template";
pub const KIND_REMOTE_PROC: &str = "remote_proc";

/// 페이로드 해석 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferFormat {
    /// 실행 가능한 모듈 텍스트 (consumer가 hook에서 해석)
    Script,
    /// 불투명한 텍스트
    Text,
}

/// kind 레벨 on_loaded hook. 레지스트리를 인자로 받으므로 전역 상태 없이
/// 그래프에 unit을 바인딩할 수 있습니다.
pub type KindLoadedHook = Arc<dyn Fn(&ClassRegistry, &Namespace, &str) -> Result<()> + Send + Sync>;

/// kind 레벨 on_unloaded hook
pub type KindUnloadedHook = Arc<dyn Fn(&ClassRegistry, &Namespace) -> Result<()> + Send + Sync>;

/// 리소스 종류: URL 규칙 + 전송 형식 + kind 레벨 hook
pub struct ResourceKind {
    name: String,
    url_prefix: String,
    url_postfix: String,
    transfer_format: TransferFormat,
    on_loaded: Option<KindLoadedHook>,
    on_unloaded: Option<KindUnloadedHook>,
}

impl ResourceKind {
    pub fn new(
        name: impl Into<String>,
        url_prefix: impl Into<String>,
        url_postfix: impl Into<String>,
        transfer_format: TransferFormat,
    ) -> Self {
        Self {
            name: name.into(),
            url_prefix: url_prefix.into(),
            url_postfix: url_postfix.into(),
            transfer_format,
            on_loaded: None,
            on_unloaded: None,
        }
    }

    /// 빌더 패턴: on_loaded hook 설정
    pub fn with_on_loaded<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassRegistry, &Namespace, &str) -> Result<()> + Send + Sync + 'static,
    {
        self.on_loaded = Some(Arc::new(hook));
        self
    }

    /// 빌더 패턴: on_unloaded hook 설정
    pub fn with_on_unloaded<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ClassRegistry, &Namespace) -> Result<()> + Send + Sync + 'static,
    {
        self.on_unloaded = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transfer_format(&self) -> TransferFormat {
        self.transfer_format
    }

    /// GET 경로: `{url_prefix}{namespace with '.' -> '/'}{url_postfix}`
    pub fn url_for(&self, namespace: &Namespace) -> String {
        format!(
            "{}{}{}",
            self.url_prefix,
            namespace.to_url_path(),
            self.url_postfix
        )
    }

    pub(crate) fn run_on_loaded(
        &self,
        registry: &ClassRegistry,
        namespace: &Namespace,
        payload: &str,
    ) -> Result<()> {
        if let Some(hook) = &self.on_loaded {
            debug!(%namespace, kind = %self.name, "kind on_loaded");
            hook(registry, namespace, payload)?;
        }
        Ok(())
    }

    pub(crate) fn run_on_unloaded(
        &self,
        registry: &ClassRegistry,
        namespace: &Namespace,
    ) -> Result<()> {
        if let Some(hook) = &self.on_unloaded {
            debug!(%namespace, kind = %self.name, "kind on_unloaded");
            hook(registry, namespace)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceKind")
            .field("name", &self.name)
            .field("url_prefix", &self.url_prefix)
            .field("url_postfix", &self.url_postfix)
            .field("transfer_format", &self.transfer_format)
            .finish()
    }
}

// ============================================================================
// StyleSheet - style kind가 그래프에 바인딩하는 unit
// ============================================================================

/// A fetched stylesheet, bound into the object graph by the style kind's
/// default `on_loaded` hook.
pub struct StyleSheet {
    source: String,
}

impl StyleSheet {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Unit for StyleSheet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// KindCatalog - 표준 kind 집합 (닫힌 집합)
// ============================================================================

/// The closed set of resource kinds, built once at process start.
pub struct KindCatalog {
    class: Arc<ResourceKind>,
    style: Arc<ResourceKind>,
    template: Arc<ResourceKind>,
    remote_proc: Arc<ResourceKind>,
}

impl KindCatalog {
    /// 표준 카탈로그:
    /// - `class`: `script/{path}.js`, script 형식
    /// - `style`: `{path}.gss`, text 형식. 기본 hook이 내려받은 스타일을
    ///   [`StyleSheet`] unit으로 그래프에 바인딩
    /// - `template`: `{path}.soy`, script 형식
    /// - `remote_proc`: `{path}.js`, script 형식 (짧은 이름으로 키잉)
    pub fn standard() -> Arc<Self> {
        let style = ResourceKind::new(KIND_STYLE, "", ".gss", TransferFormat::Text)
            .with_on_loaded(|registry, namespace, payload| {
                registry.bind(namespace, Arc::new(StyleSheet::new(payload)));
                Ok(())
            });

        Arc::new(Self {
            class: Arc::new(ResourceKind::new(
                KIND_CLASS,
                "script/",
                ".js",
                TransferFormat::Script,
            )),
            style: Arc::new(style),
            template: Arc::new(ResourceKind::new(
                KIND_TEMPLATE,
                "",
                ".soy",
                TransferFormat::Script,
            )),
            remote_proc: Arc::new(ResourceKind::new(
                KIND_REMOTE_PROC,
                "",
                ".js",
                TransferFormat::Script,
            )),
        })
    }

    pub fn class(&self) -> Arc<ResourceKind> {
        Arc::clone(&self.class)
    }

    pub fn style(&self) -> Arc<ResourceKind> {
        Arc::clone(&self.style)
    }

    pub fn template(&self) -> Arc<ResourceKind> {
        Arc::clone(&self.template)
    }

    pub fn remote_proc(&self) -> Arc<ResourceKind> {
        Arc::clone(&self.remote_proc)
    }

    /// kind 이름으로 조회 (CLI 파싱용)
    pub fn by_name(&self, name: &str) -> Option<Arc<ResourceKind>> {
        match name {
            KIND_CLASS => Some(self.class()),
            KIND_STYLE => Some(self.style()),
            KIND_TEMPLATE => Some(self.template()),
            KIND_REMOTE_PROC => Some(self.remote_proc()),
            _ => None,
        }
    }
}
