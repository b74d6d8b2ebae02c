//! External plotting command adapter
//!
//! Invokes a configured command with one flag per request field and captures
//! its output. Typed failures cross the process boundary as stderr markers:
//! a failing renderer prints a line starting with one of the known codes
//! (`BAD_INPUT:`, `DATASET_NOT_FOUND:`, `LAYER_NOT_FOUND:`, `KEY_NOT_FOUND:`)
//! and exits nonzero. Anything else nonzero surfaces as [`RenderError::Failed`]
//! with a bounded stderr tail.

use crate::{RenderError, RenderRequest, Renderer, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Number of stderr lines kept when summarizing an unclassified failure.
const STDERR_TAIL_LINES: usize = 20;

/// Renderer that shells out to an external plotting command.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
}

impl CommandRenderer {
    /// Create a renderer invoking `program` for every request.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, request: &RenderRequest) -> Result<()> {
        if !request.dataset.is_file() {
            return Err(RenderError::dataset_not_found(
                request.dataset.display().to_string(),
            ));
        }
        if let Some(parent) = request.out_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RenderError::io(e, parent, "create_dir_all"))?;
        }

        let mut cmd = Command::new(&self.program);
        cmd.arg("--dataset")
            .arg(&request.dataset)
            .arg("--key")
            .arg(request.key.as_str())
            .arg("--layer")
            .arg(&request.layer)
            .arg("--basis")
            .arg(&request.basis)
            .arg("--format")
            .arg(request.format)
            .arg("--out")
            .arg(&request.out_path);
        if let Some(dpi) = request.dpi {
            cmd.arg("--dpi").arg(dpi.to_string());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(
            program = %self.program,
            key = %request.key,
            format = request.format,
            "invoking renderer"
        );
        let output = cmd
            .output()
            .await
            .map_err(|e| RenderError::io(e, &self.program, "spawn"))?;

        if output.status.success() {
            tracing::debug!(key = %request.key, out = %request.out_path.display(), "renderer finished");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_failure(output.status.code(), &stderr))
    }
}

/// Map a nonzero renderer exit to a typed error via stderr markers.
fn classify_failure(status: Option<i32>, stderr: &str) -> RenderError {
    for line in stderr.lines() {
        let line = line.trim();
        if let Some(detail) = line.strip_prefix("BAD_INPUT:") {
            return RenderError::bad_input(detail.trim());
        }
        if let Some(detail) = line.strip_prefix("DATASET_NOT_FOUND:") {
            return RenderError::dataset_not_found(detail.trim());
        }
        if let Some(detail) = line.strip_prefix("LAYER_NOT_FOUND:") {
            return RenderError::LayerNotFound {
                detail: detail.trim().to_string(),
            };
        }
        if let Some(detail) = line.strip_prefix("KEY_NOT_FOUND:") {
            return RenderError::KeyNotFound {
                detail: detail.trim().to_string(),
            };
        }
    }

    let lines: Vec<&str> = stderr.lines().collect();
    let tail_start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    RenderError::Failed {
        status,
        stderr: lines[tail_start..].join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_lines_map_to_typed_errors() {
        let err = classify_failure(Some(1), "LAYER_NOT_FOUND: lognorm (have: counts)\n");
        assert!(matches!(err, RenderError::LayerNotFound { .. }));

        let err = classify_failure(Some(1), "noise\nKEY_NOT_FOUND: Gfap\n");
        assert!(matches!(err, RenderError::KeyNotFound { .. }));

        let err = classify_failure(Some(1), "BAD_INPUT: dpi must be positive\n");
        assert!(matches!(err, RenderError::BadInput { .. }));
    }

    #[test]
    fn unclassified_failures_keep_a_bounded_tail() {
        let noisy: String = (0..100).map(|i| format!("line {i}\n")).collect();
        let err = classify_failure(Some(2), &noisy);
        match err {
            RenderError::Failed { status, stderr } => {
                assert_eq!(status, Some(2));
                assert_eq!(stderr.lines().count(), STDERR_TAIL_LINES);
                assert!(stderr.ends_with("line 99"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
