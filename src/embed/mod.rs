//! Embedded static resources.
//!
//! - `serve` - Dev server entry page (index.html)

pub mod serve {
    use crate::compiler::{ARTIFACT_NAME, RUNTIME_SCRIPT};

    /// URL path of the subscription endpoint.
    pub const WATCH_PATH: &str = "/watch";

    /// Bootstrap page: loads the runtime, runs the artifact, and reloads it
    /// on every change notification.
    const INDEX_HTML: &str = include_str!("serve/index.html");

    /// Variables for index.html.
    ///
    /// The runtime script and artifact are relative so the page also
    /// works from a sub-directory.
    pub struct IndexVars<'a> {
        pub runtime_script: &'a str,
        pub artifact: &'a str,
        pub watch_path: &'a str,
    }

    impl Default for IndexVars<'static> {
        fn default() -> Self {
            Self {
                runtime_script: RUNTIME_SCRIPT,
                artifact: ARTIFACT_NAME,
                watch_path: WATCH_PATH,
            }
        }
    }

    pub fn render_index(vars: &IndexVars<'_>) -> String {
        INDEX_HTML
            .replace("__RUNTIME_SCRIPT__", vars.runtime_script)
            .replace("__ARTIFACT__", vars.artifact)
            .replace("__WATCH_PATH__", vars.watch_path)
    }

    /// Rendered entry page with the standard paths.
    pub fn index_html() -> String {
        render_index(&IndexVars::default())
    }
}

#[cfg(test)]
mod tests {
    use super::serve::*;

    #[test]
    fn test_index_references_endpoints() {
        let html = index_html();
        assert!(html.contains(r#"<script src="wasm_exec.js"></script>"#));
        assert!(html.contains(r#"fetch("main.wasm")"#));
        assert!(html.contains(r#"new EventSource("/watch")"#));
        assert!(html.contains(r#"addEventListener("Change""#));
        assert!(!html.contains("__"));
    }

    #[test]
    fn test_custom_vars() {
        let vars = IndexVars {
            runtime_script: "/rt.js",
            artifact: "/app.wasm",
            watch_path: "/events",
        };
        let html = render_index(&vars);
        assert!(html.contains(r#"src="/rt.js""#));
        assert!(html.contains(r#"fetch("/app.wasm")"#));
        assert!(html.contains(r#"EventSource("/events")"#));
    }
}
