use crate::render::domain::render_sink::{RenderPayload, RenderSink};

/// Render sink for headless runs: logs labels, counts frames.
/// Only the latest label is kept.
#[derive(Default)]
pub struct LogRenderSink {
    frames: usize,
    labels_shown: usize,
    last_label: Option<String>,
}

impl LogRenderSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn labels_shown(&self) -> usize {
        self.labels_shown
    }

    pub fn last_label(&self) -> Option<&str> {
        self.last_label.as_deref()
    }
}

impl RenderSink for LogRenderSink {
    fn render(&mut self, payload: &RenderPayload) -> Result<(), Box<dyn std::error::Error>> {
        self.frames += 1;
        match payload.ratio {
            Some(ratio) => log::trace!(
                "frame {}: MAR {ratio:.3} ({})",
                payload.frame.index(),
                payload.state
            ),
            None => log::trace!("frame {}: skipped", payload.frame.index()),
        }
        Ok(())
    }

    fn show_label(&mut self, label: &str) {
        log::info!("Mouth: {label}");
        self.labels_shown += 1;
        self.last_label = Some(label.to_string());
    }
}
