//! ToyMovie Onion-Skin Compositor
//!
//! Produces the live preview shown while framing the next shot: the live
//! camera image with the last few captured frames ghosted on top.
//!
//! ```text
//! live image ──► fit to display ──┐
//!                                 ├── oldest ghost  (opacity * 1/n)
//! FrameStore ─► last n frames ────┤        ...
//!                                 └── newest ghost  (opacity)
//!                                          │
//!                                          ▼
//!                                   preview image
//! ```

pub mod blend;
pub mod compositor;
pub mod overlay;

pub use compositor::*;
pub use overlay::*;
