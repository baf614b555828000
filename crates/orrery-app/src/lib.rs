//! Orrery application framework.
//!
//! Provides window creation, event handling, frame timing, and the
//! scene-drawing loop.

pub mod frame_timer;
pub mod scene_renderer;
pub mod window;
