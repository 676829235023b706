//! GPU device + surface management.
//!
//! Creates the wgpu instance, adapter, device and queue for a window, keeps
//! the surface configured, owns the depth buffer that matches it and hands out
//! per-frame encoders.

mod context;
mod init;
mod surface;

pub use context::{GpuFrame, GraphicsContext};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
