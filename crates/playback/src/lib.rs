//! ToyMovie Playback
//!
//! Replays a captured sequence as an animation:
//! - [`PlaybackController`]: play / pause / step / scrub / frame rate
//! - [`PlaybackTimer`]: the single cancellable periodic timer it owns
//! - [`run_playback`]: async loop that sleeps until each deadline

pub mod controller;
pub mod driver;
pub mod timer;

pub use controller::*;
pub use driver::*;
pub use timer::*;
