//! Freehand signature capture
//!
//! This crate provides the drawing engine behind the signature boxes of the
//! field forms. It is free of DOM types so it can be tested on the host; the
//! browser app forwards pointer/touch input and blits the surface into a
//! `<canvas>`.
//!
//! Components, leaf first:
//! - [`surface`]: RGBA pixel buffer with anti-aliased segment fill
//! - [`stroke`]: pen state and segment-by-segment stroke rendering
//! - [`lifecycle`]: keeps the surface sized to its container
//! - [`codec`]: PNG data URL encoding/decoding
//! - [`session`]: one signature pad per signer, composing the above

pub mod codec;
pub mod error;
pub mod lifecycle;
pub mod session;
pub mod stroke;
pub mod surface;

pub use codec::{decode, decode_and_draw, encode, DecodedImage, EncodedImage, RestoreOutcome};
pub use error::{CodecError, SignatureError};
pub use lifecycle::{ContainerBox, ResizeOutcome, ResizePolicy, SurfaceLifecycle};
pub use session::{CaptureSession, RestoreTicket, SessionOptions, SessionState};
pub use stroke::{PenStyle, StrokePoint, StrokeRenderer, SurfaceOrigin};
pub use surface::{RasterSurface, Rgba};
