use std::path::PathBuf;

use crate::context::ShaderStage;

/// Failure of a single shader stage. Soft: the other stage still compiles.
///
/// The display text is exactly what gets handed to the reporter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("Unable to create shader object")]
    ObjectCreation { stage: ShaderStage, reason: String },
    #[error("Shader compilation error: {log}")]
    Compile { stage: ShaderStage, log: String },
}

impl ShaderError {
    pub fn stage(&self) -> ShaderStage {
        match self {
            ShaderError::ObjectCreation { stage, .. } | ShaderError::Compile { stage, .. } => {
                *stage
            }
        }
    }
}

/// Why `build_program` produced no program. Every object it allocated has
/// already been released when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// `stages` holds any stage that also failed; both stages are still
    /// compiled so their diagnostics are reported.
    #[error("Unable to create program object: {reason}")]
    ProgramCreation {
        reason: String,
        stages: Vec<ShaderError>,
    },
    #[error("{} shader stage(s) failed: {}", .0.len(), stage_list(.0))]
    Stages(Vec<ShaderError>),
    #[error("Program link error: {0}")]
    Link(String),
}

fn stage_list(failures: &[ShaderError]) -> String {
    failures
        .iter()
        .map(|f| f.stage().name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from loading shader source text.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read shader source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("shader source {} is empty", .path.display())]
    Empty { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reportable_text() {
        let creation = ShaderError::ObjectCreation {
            stage: ShaderStage::Vertex,
            reason: "out of memory".into(),
        };
        assert_eq!(creation.to_string(), "Unable to create shader object");

        let compile = ShaderError::Compile {
            stage: ShaderStage::Fragment,
            log: "ERROR: 0:3: syntax error".into(),
        };
        assert_eq!(
            compile.to_string(),
            "Shader compilation error: ERROR: 0:3: syntax error"
        );
        assert_eq!(compile.stage(), ShaderStage::Fragment);

        assert_eq!(
            BuildError::Link("mismatch".into()).to_string(),
            "Program link error: mismatch"
        );
    }

    #[test]
    fn program_creation_text_omits_stages() {
        let err = BuildError::ProgramCreation {
            reason: "context lost".into(),
            stages: vec![ShaderError::ObjectCreation {
                stage: ShaderStage::Fragment,
                reason: "context lost".into(),
            }],
        };
        assert_eq!(err.to_string(), "Unable to create program object: context lost");
    }

    #[test]
    fn stages_lists_failed_stages() {
        let err = BuildError::Stages(vec![
            ShaderError::Compile {
                stage: ShaderStage::Vertex,
                log: String::new(),
            },
            ShaderError::Compile {
                stage: ShaderStage::Fragment,
                log: String::new(),
            },
        ]);
        assert_eq!(err.to_string(), "2 shader stage(s) failed: vertex, fragment");
    }
}
