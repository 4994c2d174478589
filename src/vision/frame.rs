//! Camera frames and their release-once lifecycle
//!
//! The camera hands out a bounded pool of buffers and stalls when the
//! consumer never gives them back. A [`Frame`] therefore carries the
//! camera's release hook and guarantees it runs exactly once: either through
//! an explicit [`Frame::release`] when analysis completes, or on drop when
//! the frame is discarded (dropped by the sampler, abandoned by a cancelled
//! analysis, left in the queue at shutdown).

use crate::platform::InputImage;
use crate::types::Rotation;
use std::time::Duration;

type ReleaseHook = Box<dyn FnOnce() + Send + 'static>;

/// One camera-captured image plus metadata
pub struct Frame {
    luminance: Vec<u8>,
    width: u32,
    height: u32,
    rotation: Rotation,
    /// Monotonic capture time, relative to the start of the camera stream
    timestamp: Duration,
    release_hook: Option<ReleaseHook>,
    released: bool,
}

impl Frame {
    /// Create a frame from its luminance plane.
    ///
    /// Frames built this way have no release hook; attach one with
    /// [`Frame::with_release_hook`] when the source needs its buffer back.
    pub fn new(
        luminance: Vec<u8>,
        width: u32,
        height: u32,
        rotation: Rotation,
        timestamp: Duration,
    ) -> Self {
        Self {
            luminance,
            width,
            height,
            rotation,
            timestamp,
            release_hook: None,
            released: false,
        }
    }

    /// Attach the callback that returns the buffer to the camera
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release_hook = Some(Box::new(hook));
        self
    }

    /// Pixel-intensity plane, one byte per pixel
    pub fn luminance_plane(&self) -> &[u8] {
        &self.luminance
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Borrow the image for an inference call
    pub fn input_image(&self) -> InputImage<'_> {
        InputImage {
            data: &self.luminance,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
        }
    }

    /// Give the buffer back to the camera.
    ///
    /// Returns true only for the call that actually released; repeated calls
    /// are no-ops.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        if let Some(hook) = self.release_hook.take() {
            hook();
        }
        true
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation", &self.rotation)
            .field("timestamp", &self.timestamp)
            .field("bytes", &self.luminance.len())
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counted_frame(counter: &Arc<AtomicUsize>) -> Frame {
        let counter = Arc::clone(counter);
        Frame::new(vec![10; 16], 4, 4, Rotation::Deg270, Duration::from_millis(33))
            .with_release_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
    }

    #[test]
    fn test_double_release_is_noop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut frame = counted_frame(&counter);

        assert!(frame.release());
        assert!(!frame.release());
        assert!(frame.is_released());
        drop(frame);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let counter = Arc::new(AtomicUsize::new(0));
        let frame = counted_frame(&counter);
        drop(frame);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_without_hook() {
        let mut frame = Frame::new(Vec::new(), 0, 0, Rotation::Deg0, Duration::ZERO);
        assert!(frame.release());
        assert!(!frame.release());
    }

    #[test]
    fn test_input_image_borrows_metadata() {
        let counter = Arc::new(AtomicUsize::new(0));
        let frame = counted_frame(&counter);
        let image = frame.input_image();
        assert_eq!(image.data.len(), 16);
        assert_eq!(image.width, 4);
        assert_eq!(image.rotation, Rotation::Deg270);
    }
}
