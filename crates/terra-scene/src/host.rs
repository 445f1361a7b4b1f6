//! The presentation surface the scene draws into.

use crate::frame::FrameHandle;

/// Pixel size of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both dimensions raised to at least 1.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }

    pub fn aspect_ratio(self) -> f32 {
        let s = self.clamped();
        s.width as f32 / s.height as f32
    }
}

/// Registration token for a resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A surface that reports its size, accepts resize listeners and schedules
/// animation frames.
pub trait SurfaceHost {
    fn size(&self) -> SurfaceSize;

    fn add_resize_listener(&mut self) -> ListenerId;

    /// Returns `false` if `id` was not registered.
    fn remove_resize_listener(&mut self, id: ListenerId) -> bool;

    fn listener_count(&self) -> usize;

    /// Ask for `handle` to be delivered on the next frame.
    fn request_frame(&mut self, handle: FrameHandle);

    /// Withdraw a request made with [`request_frame`](Self::request_frame).
    fn cancel_frame(&mut self, handle: FrameHandle);
}

impl<T: SurfaceHost + ?Sized> SurfaceHost for &mut T {
    fn size(&self) -> SurfaceSize {
        (**self).size()
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        (**self).add_resize_listener()
    }

    fn remove_resize_listener(&mut self, id: ListenerId) -> bool {
        (**self).remove_resize_listener(id)
    }

    fn listener_count(&self) -> usize {
        (**self).listener_count()
    }

    fn request_frame(&mut self, handle: FrameHandle) {
        (**self).request_frame(handle);
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        (**self).cancel_frame(handle);
    }
}
