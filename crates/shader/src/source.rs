use std::path::{Path, PathBuf};

use crate::error::SourceError;

pub const VERTEX_FILE_NAME: &str = "ray-tracer.vert";
pub const FRAGMENT_FILE_NAME: &str = "ray-tracer.frag";

/// Where the two stage sources live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self::in_dir("shaders")
    }
}

impl ShaderPaths {
    /// The ray tracer's two stage files inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            vertex: dir.join(VERTEX_FILE_NAME),
            fragment: dir.join(FRAGMENT_FILE_NAME),
        }
    }
}

/// Source text for both stages, held only until the program is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Read both stage files. The two reads run concurrently; if both fail
    /// the vertex error is returned.
    pub fn load(paths: &ShaderPaths) -> Result<Self, SourceError> {
        let (vertex, fragment) = std::thread::scope(|scope| {
            let vertex = scope.spawn(|| read_source(&paths.vertex));
            let fragment = read_source(&paths.fragment);
            let vertex = vertex
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (vertex, fragment)
        });

        Ok(Self {
            vertex: vertex?,
            fragment: fragment?,
        })
    }
}

fn read_source(path: &Path) -> Result<String, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if text.trim().is_empty() {
        return Err(SourceError::Empty {
            path: path.to_path_buf(),
        });
    }
    tracing::debug!(path = %path.display(), bytes = text.len(), "loaded shader source");
    Ok(text)
}
