//! Editor surfaces the draft buffers bind to

use crate::error::{IdeError, IdeResult};
use std::fs;
use std::path::{Path, PathBuf};

/// The visible editor: whatever text the user is currently looking at
pub trait EditorSurface {
    /// Current editor content
    fn text(&self) -> IdeResult<String>;

    /// Replace the editor content
    fn set_text(&mut self, text: &str) -> IdeResult<()>;
}

/// Editor backed by a single file the user edits with any tool
#[derive(Debug, Clone)]
pub struct FileSurface {
    path: PathBuf,
}

impl FileSurface {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EditorSurface for FileSurface {
    fn text(&self) -> IdeResult<String> {
        if !self.path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&self.path)
            .map_err(|e| IdeError::io(format!("reading editor {}", self.path.display()), e))
    }

    fn set_text(&mut self, text: &str) -> IdeResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| IdeError::io("creating editor directory", e))?;
        }
        fs::write(&self.path, text)
            .map_err(|e| IdeError::io(format!("writing editor {}", self.path.display()), e))
    }
}

/// Editor held in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    text: String,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user typing over the whole editor
    pub fn type_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

impl EditorSurface for MemorySurface {
    fn text(&self) -> IdeResult<String> {
        Ok(self.text.clone())
    }

    fn set_text(&mut self, text: &str) -> IdeResult<()> {
        self.text = text.to_string();
        Ok(())
    }
}
