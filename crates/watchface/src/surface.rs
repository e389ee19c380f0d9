//! Drawing targets

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::directive::RenderDirective;

/// Receives one directive per drawn frame
pub trait Surface: Send {
    fn draw(&mut self, directive: &RenderDirective);
}

/// Writes each frame to the log
#[derive(Debug, Default)]
pub struct LogSurface {
    frames: u64,
}

impl LogSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for LogSurface {
    fn draw(&mut self, directive: &RenderDirective) {
        self.frames += 1;
        info!(
            frame = self.frames,
            ambient = directive.ambient,
            anti_alias = directive.anti_alias,
            "{directive}"
        );
    }
}

/// Keeps every frame; clones share the same frame list
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    frames: Arc<Mutex<Vec<RenderDirective>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<RenderDirective> {
        self.frames.lock().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn last(&self) -> Option<RenderDirective> {
        self.frames.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.frames.lock().clear();
    }
}

impl Surface for RecordingSurface {
    fn draw(&mut self, directive: &RenderDirective) {
        self.frames.lock().push(directive.clone());
    }
}
