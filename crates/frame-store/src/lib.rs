//! ToyMovie Frame Store
//!
//! The data model for a single in-progress stop-motion sequence:
//! - **Frame:** an immutable captured still with its capture time and position
//! - **FramePayload:** the encoded image bytes behind a frame
//! - **FrameStore:** the ordered sequence, mutated only at the tail or as a whole

pub mod frame;
pub mod store;

pub use frame::*;
pub use store::*;
