//! Test data builders for creating test objects

use blink_swipe::types::Rotation;
use blink_swipe::vision::Frame;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating test Frames with a counted release hook
pub struct FrameBuilder {
    width: u32,
    height: u32,
    luma: u8,
    rotation: Rotation,
    timestamp: Duration,
    released: Option<Arc<AtomicUsize>>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            width: 16,
            height: 16,
            luma: 128,
            rotation: Rotation::Deg270,
            timestamp: Duration::ZERO,
            released: None,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Fill the luminance plane with one value
    pub fn luma(mut self, luma: u8) -> Self {
        self.luma = luma;
        self
    }

    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Count releases of the built frame into `counter`
    pub fn counted(mut self, counter: &Arc<AtomicUsize>) -> Self {
        self.released = Some(Arc::clone(counter));
        self
    }

    pub fn build(self) -> Frame {
        let plane = vec![self.luma; (self.width as usize) * (self.height as usize)];
        let frame = Frame::new(plane, self.width, self.height, self.rotation, self.timestamp);
        match self.released {
            Some(counter) => frame.with_release_hook(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            None => frame,
        }
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_builder() {
        let counter = Arc::new(AtomicUsize::new(0));
        let frame = FrameBuilder::new()
            .size(4, 2)
            .luma(7)
            .rotation(Rotation::Deg90)
            .counted(&counter)
            .build();

        assert_eq!(frame.luminance_plane(), &[7u8; 8]);
        assert_eq!(frame.rotation(), Rotation::Deg90);
        drop(frame);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
