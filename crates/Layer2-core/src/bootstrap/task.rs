//! Bootstrap task descriptors.

use serde::{Deserialize, Serialize};

/// Wire value for script resources.
pub const KIND_SCRIPT: &str = "script";
/// Wire value for stylesheet resources.
pub const KIND_STYLESHEET: &str = "stylesheet";

/// One startup resource: what to fetch, and which ids must have completed
/// first. Ephemeral - lives only for the duration of one bootstrap run.
///
/// The kind stays a plain string until scheduling so that a manifest naming
/// an unrecognized kind parses fine and aborts the run at scan time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLoadTask {
    pub id: String,

    /// Location relative to the transport base.
    pub source_location: String,

    /// `"script"` or `"stylesheet"`.
    pub kind: String,

    /// Ids that must be loaded before this task becomes loadable.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ResourceLoadTask {
    pub fn script(id: impl Into<String>, source_location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_location: source_location.into(),
            kind: KIND_SCRIPT.to_string(),
            depends_on: Vec::new(),
        }
    }

    pub fn stylesheet(id: impl Into<String>, source_location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_location: source_location.into(),
            kind: KIND_STYLESHEET.to_string(),
            depends_on: Vec::new(),
        }
    }

    /// 빌더 패턴: 의존성 추가
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.depends_on.push(id.into());
        self
    }
}

/// The platform's own self-bootstrap: the runtime bundle (which defines the
/// registry and class engine) after the template bundle, plus an independent
/// remote-procedure stub bundle and a shared stylesheet bundle.
pub fn platform_manifest() -> Vec<ResourceLoadTask> {
    vec![
        ResourceLoadTask::script("runtime-bundle", "script/runtime-all.js")
            .depends_on("template-bundle"),
        ResourceLoadTask::script("rpc-stub-bundle", "script/rpc-public.js"),
        ResourceLoadTask::stylesheet("style-bundle", "styles/common-all.css"),
        ResourceLoadTask::script("template-bundle", "templates/common-all.js"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_round_trip() {
        let raw = r#"[
            {"id": "a", "sourceLocation": "script/a.js", "kind": "script"},
            {"id": "b", "sourceLocation": "styles/b.css", "kind": "stylesheet", "dependsOn": ["a"]}
        ]"#;
        let tasks: Vec<ResourceLoadTask> = serde_json::from_str(raw).unwrap();

        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].depends_on.is_empty());
        assert_eq!(tasks[1].depends_on, vec!["a".to_string()]);
        assert_eq!(tasks[1].kind, KIND_STYLESHEET);
    }

    #[test]
    fn test_unknown_kind_still_parses() {
        // scheduling, not parsing, rejects unknown kinds
        let raw = r#"[{"id": "f", "sourceLocation": "fonts/f.woff", "kind": "font"}]"#;
        let tasks: Vec<ResourceLoadTask> = serde_json::from_str(raw).unwrap();
        assert_eq!(tasks[0].kind, "font");
    }

    #[test]
    fn test_platform_manifest_shape() {
        let tasks = platform_manifest();
        assert_eq!(tasks.len(), 4);
        let runtime = tasks.iter().find(|t| t.id == "runtime-bundle").unwrap();
        assert_eq!(runtime.depends_on, vec!["template-bundle".to_string()]);
    }
}
