//! Keeps a raster surface sized to its visual container
//!
//! Every attach and every container resize immediately resizes the surface,
//! which clears it. There is no debounce: a resize in the middle of signing
//! drops the strokes drawn so far.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::surface::RasterSurface;

/// Content box of the surface's container, in integral CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerBox {
    pub width: u32,
    pub height: u32,
}

impl ContainerBox {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Not laid out yet (e.g. inside a hidden parent)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// What happens to drawn content when the container resizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizePolicy {
    /// Resize clears the surface and nothing is redrawn
    #[default]
    Clear,
    /// Resize clears, then the session's last exported or restored image is redrawn
    ReapplyLastKnown,
}

/// Result of one sizing pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOutcome {
    pub size: ContainerBox,
    /// Whether a last-known image was drawn back after the clear
    pub reapplied: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceLifecycle {
    policy: ResizePolicy,
    container: Option<ContainerBox>,
    resize_count: u64,
}

impl SurfaceLifecycle {
    pub fn new(policy: ResizePolicy) -> Self {
        Self {
            policy,
            container: None,
            resize_count: 0,
        }
    }

    pub fn policy(&self) -> ResizePolicy {
        self.policy
    }

    /// Container box applied by the most recent sizing pass
    pub fn container(&self) -> Option<ContainerBox> {
        self.container
    }

    /// Number of sizing passes so far (attach included)
    pub fn resize_count(&self) -> u64 {
        self.resize_count
    }

    /// Initial sizing when the surface is attached to its container
    pub fn attach(&mut self, surface: &mut RasterSurface, container: ContainerBox) {
        self.apply(surface, container);
    }

    /// Container resized: resize (and therefore clear) the surface
    pub fn on_container_resize(&mut self, surface: &mut RasterSurface, container: ContainerBox) {
        self.apply(surface, container);
    }

    fn apply(&mut self, surface: &mut RasterSurface, container: ContainerBox) {
        surface.resize(container.width, container.height);
        self.container = Some(container);
        self.resize_count += 1;
        debug!(
            width = container.width,
            height = container.height,
            pass = self.resize_count,
            "signature surface resized"
        );
    }
}
