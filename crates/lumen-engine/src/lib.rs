//! Lumen engine crate.
//!
//! A small real-time renderer: a batched 2D quad/text renderer and an
//! immediate 3D mesh renderer sharing one texture-slot allocator, on top of
//! wgpu, plus the window/event/input shell and camera controllers that drive
//! them.

pub mod camera;
pub mod core;
pub mod device;
pub mod events;
pub mod input;
pub mod logging;
pub mod render;
pub mod text;
pub mod time;
pub mod window;
