//! ToyMovie Capture Engine
//!
//! Captures frames from a live source into the active sequence and keeps
//! the onion-skin preview and the player in step with every change.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               StopMotionSession               │
//! │  ┌────────────┐   ┌─────────────────┐         │
//! │  │ LiveSource │──▶│ CapturePipeline │         │
//! │  └─────┬──────┘   └────────┬────────┘         │
//! │        │                   ▼                  │
//! │        │           ┌──────────────┐           │
//! │        │           │  FrameStore  │──────┐    │
//! │        │           └──────┬───────┘      │    │
//! │        ▼                  ▼              ▼    │
//! │  ┌──────────────────────────────┐ ┌─────────┐ │
//! │  │     OnionSkinCompositor      │ │Playback │ │
//! │  └──────────────────────────────┘ └─────────┘ │
//! └───────────────────────────────────────────────┘
//! ```

pub mod pipeline;
pub mod session;
pub mod source;

pub use pipeline::*;
pub use session::*;
pub use source::*;
