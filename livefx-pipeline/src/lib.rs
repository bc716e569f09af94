//! Per-frame orchestration: decode camera YUV, grade through the active
//! LUT, rotate for display and re-pack for encoding.
//!
//! A [`FramePipeline`] owns up to three output sinks (preview, encoder,
//! still capture) and is driven from the camera callback thread with
//! [`FramePipeline::process_frame`]. Controls arrive from other threads
//! through the cloneable [`PipelineControl`] handle; each frame observes
//! one consistent snapshot of filter, rotation and capture state.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{debug, warn};

use livefx_convert::{rgba_to_nv21, rotate::rotate, yuv420_to_rgba};
use livefx_formats::{Nv21Buffer, OwnedFrame, Rgba8, Rotation, YuvPlanarImage};
use livefx_lut::{apply_in_place, Lut3d, LutRegistry};

/// The filter name that selects pass-through grading.
pub const NO_FILTER: &str = "None";

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("no output buffer available")]
    BufferUnavailable,
    #[error("sink disconnected")]
    Disconnected,
    #[error("{0}")]
    Other(String),
}

/// Receives graded, display-rotated frames.
pub trait PreviewSink: Send {
    fn push_preview(&mut self, frame: &OwnedFrame<Rgba8>) -> Result<(), SinkError>;
}

/// Receives graded, unrotated NV21 frames with a monotonic microsecond
/// timestamp.
pub trait EncoderSink: Send {
    fn push_nv21(&mut self, frame: &Nv21Buffer, timestamp_us: i64) -> Result<(), SinkError>;
}

/// Receives graded, unrotated still frames, one per capture request.
pub trait CaptureSink: Send {
    fn push_still(&mut self, frame: OwnedFrame<Rgba8>) -> Result<(), SinkError>;
}

/// State shared between control handles and the frame thread.
struct ControlState {
    registry: LutRegistry,
    active_lut: RwLock<Option<Arc<Lut3d>>>,
    capture_requested: AtomicBool,
    rotation_degrees: AtomicU32,
}

/// Cloneable, thread-safe control surface of a pipeline.
#[derive(Clone)]
pub struct PipelineControl {
    state: Arc<ControlState>,
}

impl PipelineControl {
    /// Select the active grading filter by name.
    ///
    /// [`NO_FILTER`] and unknown names both select pass-through; an
    /// unknown name is logged. Takes effect from the next frame.
    pub fn set_filter(&self, name: &str) {
        let lut = if name == NO_FILTER {
            None
        } else {
            let lut = self.state.registry.get(name);
            if lut.is_none() {
                debug!("unknown filter {name:?}, grading disabled");
            }
            lut
        };
        *self.state.active_lut.write() = lut;
    }

    pub fn has_active_filter(&self) -> bool {
        self.state.active_lut.read().is_some()
    }

    /// Request a still capture from the next processed frame.
    ///
    /// Requests arriving before that frame coalesce into one capture.
    pub fn request_capture(&self) {
        self.state.capture_requested.store(true, Ordering::Release);
    }

    /// Set the display rotation. Values other than 0/90/180/270 are
    /// ignored.
    pub fn set_rotation_degrees(&self, degrees: u32) {
        match Rotation::from_degrees(degrees) {
            Some(_) => self
                .state
                .rotation_degrees
                .store(degrees, Ordering::Relaxed),
            None => warn!("ignoring invalid rotation {degrees}"),
        }
    }

    pub fn rotation(&self) -> Rotation {
        rotation_of(&self.state)
    }
}

fn rotation_of(state: &ControlState) -> Rotation {
    let degrees = state.rotation_degrees.load(Ordering::Relaxed);
    Rotation::from_degrees(degrees).unwrap_or_default()
}

/// The per-frame processing engine.
///
/// Owned by the frame thread; sinks are attached and detached between
/// frames by whoever owns the pipeline.
pub struct FramePipeline {
    state: Arc<ControlState>,
    preview: Option<Box<dyn PreviewSink>>,
    encoder: Option<Box<dyn EncoderSink>>,
    capture: Option<Box<dyn CaptureSink>>,
    epoch: Instant,
}

impl FramePipeline {
    pub fn new(registry: LutRegistry) -> Self {
        Self {
            state: Arc::new(ControlState {
                registry,
                active_lut: RwLock::new(None),
                capture_requested: AtomicBool::new(false),
                rotation_degrees: AtomicU32::new(0),
            }),
            preview: None,
            encoder: None,
            capture: None,
            epoch: Instant::now(),
        }
    }

    /// A control handle for other threads.
    pub fn control(&self) -> PipelineControl {
        PipelineControl {
            state: self.state.clone(),
        }
    }

    pub fn attach_preview(&mut self, sink: Box<dyn PreviewSink>) {
        self.preview = Some(sink);
    }

    pub fn detach_preview(&mut self) -> Option<Box<dyn PreviewSink>> {
        self.preview.take()
    }

    pub fn attach_encoder(&mut self, sink: Box<dyn EncoderSink>) {
        self.encoder = Some(sink);
    }

    pub fn detach_encoder(&mut self) -> Option<Box<dyn EncoderSink>> {
        self.encoder.take()
    }

    pub fn attach_capture(&mut self, sink: Box<dyn CaptureSink>) {
        self.capture = Some(sink);
    }

    pub fn detach_capture(&mut self) -> Option<Box<dyn CaptureSink>> {
        self.capture.take()
    }

    /// Process one camera frame.
    ///
    /// Without a preview sink the frame is dropped entirely. Failures in
    /// one output branch are logged and do not affect the others.
    pub fn process_frame(&mut self, frame: &YuvPlanarImage<'_>) {
        if self.preview.is_none() {
            debug!("no preview surface, dropping frame");
            return;
        }

        let mut rgba = match yuv420_to_rgba(frame) {
            Ok(rgba) => rgba,
            Err(e) => {
                warn!("dropping frame: {e}");
                return;
            }
        };

        // One snapshot per frame. A filter change mid-frame waits for the
        // next one.
        let lut = self.state.active_lut.read().clone();
        if let Some(lut) = &lut {
            apply_in_place(lut, &mut rgba);
        }

        if self.state.capture_requested.swap(false, Ordering::AcqRel) {
            match &mut self.capture {
                Some(sink) => {
                    if let Err(e) = sink.push_still(rgba.clone()) {
                        warn!("capture sink failed: {e}");
                    }
                }
                None => debug!("capture requested with no capture sink"),
            }
        }

        let rotation = rotation_of(&self.state);
        {
            // 0 and 180 pass through untouched, the display surface
            // handles those orientations itself.
            let preview_frame = if rotation.swaps_dimensions() {
                Some(rotate(&rgba, rotation))
            } else {
                None
            };
            let preview_frame = preview_frame.as_ref().unwrap_or(&rgba);
            if let Some(sink) = &mut self.preview {
                if let Err(e) = sink.push_preview(preview_frame) {
                    warn!("preview sink failed: {e}");
                }
            }
        }

        if let Some(sink) = &mut self.encoder {
            match rgba_to_nv21(&rgba) {
                Ok(nv21) => {
                    let timestamp_us = self.epoch.elapsed().as_micros() as i64;
                    if let Err(e) = sink.push_nv21(&nv21, timestamp_us) {
                        warn!("encoder sink failed: {e}");
                    }
                }
                Err(e) => warn!("NV21 re-pack failed: {e}"),
            }
        }
    }
}
