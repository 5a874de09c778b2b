//! On-request artifact build.
//!
//! Every request runs the compiler; the response carries either the fresh
//! artifact or the compiler output verbatim.

use crate::compiler::{ARTIFACT_NAME, BuildResult, Builder};
use crate::logger;
use crate::utils::date::DateTimeUtc;
use crate::utils::mime::types::PLAIN;

use super::response::Reply;

/// Build and answer with the artifact or the build log.
pub fn serve_artifact(builder: &Builder) -> Reply {
    match builder.build() {
        Ok(BuildResult::Built(artifact)) => {
            let log = artifact.log.trim_end();
            if !log.is_empty() {
                logger::status_warning(log);
            }
            logger::status_success(&format!(
                "built {} ({} in {}ms)",
                ARTIFACT_NAME,
                format_size(artifact.bytes.len()),
                artifact.elapsed.as_millis()
            ));

            let modified = DateTimeUtc::from_system_time(artifact.modified).to_rfc2822();
            Reply::ok(artifact.content_type, artifact.bytes)
                .with_header("Last-Modified", modified)
                .with_header("Cache-Control", "no-cache")
        }
        Ok(BuildResult::Failed(failure)) => {
            logger::status_error(
                &format!("build failed: {}", failure.status()),
                String::from_utf8_lossy(&failure.output).trim_end(),
            );
            Reply::new(500, PLAIN, failure.output)
        }
        Err(e) => {
            crate::log!("error"; "{:#}", e);
            Reply::error(500, &format!("{e:#}"))
        }
    }
}

/// Human-readable byte count.
fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}
