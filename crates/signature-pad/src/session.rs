//! Capture session: one signature pad bound to one signer
//!
//! A session owns its raster surface outright; nothing else draws on it.
//!
//! ## State machine
//! ```text
//! Empty --pointer_down--> Drawing --pointer_up--> IdleWithContent
//! IdleWithContent --clear--> Empty
//! IdleWithContent --resize--> Empty            (Clear policy)
//! Empty | IdleWithContent --restore--> IdleWithContent
//! ```
//!
//! ## Restores
//! Decoding happens off the input path. `request_restore` hands out a ticket
//! stamped with a monotonic generation, the caller decodes it whenever the
//! event loop allows, and `complete_restore` applies the result only if no
//! newer restore (or clear) was issued meanwhile. The last request wins; an
//! older decode finishing late is reported as superseded.

use tracing::{debug, warn};

use crate::codec::{self, DecodedImage, EncodedImage, RestoreOutcome};
use crate::error::{CodecError, SignatureError};
use crate::lifecycle::{ContainerBox, ResizeOutcome, ResizePolicy, SurfaceLifecycle};
use crate::stroke::{PenStyle, StrokePoint, StrokeRenderer};
use crate::surface::RasterSurface;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionOptions {
    pub pen: PenStyle,
    pub resize_policy: ResizePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not bound to a container; input is ignored
    Detached,
    Empty,
    Drawing,
    IdleWithContent,
}

/// A pending restore; decode it, then hand the result back to the session
#[derive(Debug, Clone)]
pub struct RestoreTicket {
    generation: u64,
    image: EncodedImage,
}

impl RestoreTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    pub fn decode(&self) -> Result<DecodedImage, CodecError> {
        codec::decode(&self.image)
    }
}

#[derive(Debug)]
pub struct CaptureSession {
    label: String,
    surface: RasterSurface,
    renderer: StrokeRenderer,
    lifecycle: SurfaceLifecycle,
    attached: bool,
    has_content: bool,
    last_known: Option<EncodedImage>,
    restore_generation: u64,
}

impl CaptureSession {
    /// Create a detached session. `label` names the signer in logs.
    pub fn new(label: impl Into<String>, options: SessionOptions) -> Self {
        Self {
            label: label.into(),
            surface: RasterSurface::new(0, 0),
            renderer: StrokeRenderer::new(options.pen),
            lifecycle: SurfaceLifecycle::new(options.resize_policy),
            attached: false,
            has_content: false,
            last_known: None,
            restore_generation: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    pub fn lifecycle(&self) -> &SurfaceLifecycle {
        &self.lifecycle
    }

    /// Image re-applied after resizes under [`ResizePolicy::ReapplyLastKnown`]
    pub fn last_known(&self) -> Option<&EncodedImage> {
        self.last_known.as_ref()
    }

    pub fn state(&self) -> SessionState {
        if !self.attached {
            SessionState::Detached
        } else if self.renderer.is_drawing() {
            SessionState::Drawing
        } else if self.has_content {
            SessionState::IdleWithContent
        } else {
            SessionState::Empty
        }
    }

    /// Bind to a container and size the surface to it
    pub fn attach(&mut self, container: ContainerBox) -> ResizeOutcome {
        self.attached = true;
        self.lifecycle.attach(&mut self.surface, container);
        self.after_resize(container)
    }

    /// Stop accepting input. The surface keeps its pixels.
    pub fn detach(&mut self) {
        self.renderer.end();
        self.attached = false;
        debug!(signer = %self.label, "signature pad detached");
    }

    /// Container changed size. Ignored while detached.
    pub fn on_container_resize(&mut self, container: ContainerBox) -> Option<ResizeOutcome> {
        if !self.attached {
            return None;
        }
        self.lifecycle.on_container_resize(&mut self.surface, container);
        Some(self.after_resize(container))
    }

    pub fn pointer_down(&mut self, point: StrokePoint) {
        if self.attached {
            self.renderer.begin(point);
        }
    }

    pub fn pointer_move(&mut self, point: StrokePoint) {
        if self.attached && self.renderer.extend(&mut self.surface, point) {
            self.has_content = true;
        }
    }

    pub fn pointer_up(&mut self) {
        self.renderer.end();
    }

    /// Erase everything and forget the last-known image. Any restore still
    /// in flight is superseded.
    pub fn clear(&mut self) {
        self.renderer.clear(&mut self.surface);
        self.has_content = false;
        self.last_known = None;
        self.restore_generation += 1;
    }

    /// Encode the current surface. Never cached: each call reads the pixels.
    pub fn export(&mut self) -> Result<EncodedImage, SignatureError> {
        if !self.attached {
            return Err(SignatureError::Detached);
        }
        let image = codec::encode(&self.surface)?;
        self.last_known = Some(image.clone());
        Ok(image)
    }

    /// Start a restore. `None` means nothing to restore and yields no ticket.
    pub fn request_restore(&mut self, image: Option<EncodedImage>) -> Option<RestoreTicket> {
        let image = image?;
        self.restore_generation += 1;
        Some(RestoreTicket {
            generation: self.restore_generation,
            image,
        })
    }

    /// Finish a restore with the decode result for `ticket`. A detached
    /// session has no sized surface to draw on and reports
    /// [`SignatureError::Detached`]; the ticket stays unapplied.
    pub fn complete_restore(
        &mut self,
        ticket: RestoreTicket,
        decoded: Result<DecodedImage, CodecError>,
    ) -> Result<RestoreOutcome, SignatureError> {
        if ticket.generation != self.restore_generation {
            debug!(
                signer = %self.label,
                ticket = ticket.generation,
                current = self.restore_generation,
                "stale signature restore discarded"
            );
            return Ok(RestoreOutcome::Superseded);
        }
        if !self.attached {
            return Err(SignatureError::Detached);
        }

        let decoded = decoded?;
        self.surface.draw_image(&decoded, 0, 0);
        self.has_content = true;
        self.last_known = Some(ticket.image);
        debug!(signer = %self.label, "signature restored");
        Ok(RestoreOutcome::Applied)
    }

    /// Request, decode and complete in one go
    pub fn restore(&mut self, image: Option<EncodedImage>) -> Result<RestoreOutcome, SignatureError> {
        match self.request_restore(image) {
            Some(ticket) => {
                let decoded = ticket.decode();
                self.complete_restore(ticket, decoded)
            }
            None => Ok(RestoreOutcome::Skipped),
        }
    }

    fn after_resize(&mut self, size: ContainerBox) -> ResizeOutcome {
        self.has_content = false;
        let reapplied = match (self.lifecycle.policy(), self.last_known.as_ref()) {
            (ResizePolicy::ReapplyLastKnown, Some(image)) => {
                match codec::decode_and_draw(&mut self.surface, Some(image)) {
                    Ok(_) => {
                        self.has_content = true;
                        true
                    }
                    Err(e) => {
                        warn!(signer = %self.label, error = %e, "could not re-apply signature after resize");
                        self.last_known = None;
                        false
                    }
                }
            }
            _ => false,
        };
        ResizeOutcome { size, reapplied }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached(policy: ResizePolicy) -> CaptureSession {
        let mut session = CaptureSession::new(
            "tech",
            SessionOptions {
                resize_policy: policy,
                ..Default::default()
            },
        );
        session.attach(ContainerBox::new(120, 60));
        session
    }

    fn scribble(session: &mut CaptureSession) {
        session.pointer_down(StrokePoint::new(10.0, 10.0));
        session.pointer_move(StrokePoint::new(60.0, 40.0));
        session.pointer_move(StrokePoint::new(100.0, 20.0));
        session.pointer_up();
    }

    #[test]
    fn test_new_session_is_detached() {
        let session = CaptureSession::new("customer", SessionOptions::default());
        assert_eq!(session.state(), SessionState::Detached);
        assert_eq!(session.label(), "customer");
    }

    #[test]
    fn test_state_transitions() {
        let mut session = attached(ResizePolicy::Clear);
        assert_eq!(session.state(), SessionState::Empty);

        session.pointer_down(StrokePoint::new(5.0, 5.0));
        assert_eq!(session.state(), SessionState::Drawing);
        session.pointer_move(StrokePoint::new(50.0, 30.0));
        session.pointer_up();
        assert_eq!(session.state(), SessionState::IdleWithContent);

        session.clear();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.surface().is_blank());
    }

    #[test]
    fn test_pen_down_and_up_without_move_stays_empty() {
        let mut session = attached(ResizePolicy::Clear);
        session.pointer_down(StrokePoint::new(5.0, 5.0));
        session.pointer_up();
        assert_eq!(session.state(), SessionState::Empty);
    }

    #[test]
    fn test_detached_session_ignores_input() {
        let mut session = attached(ResizePolicy::Clear);
        session.detach();
        scribble(&mut session);
        assert!(session.surface().is_blank());
        assert!(matches!(session.export(), Err(SignatureError::Detached)));
        assert!(session.on_container_resize(ContainerBox::new(10, 10)).is_none());
    }

    #[test]
    fn test_resize_clears_under_default_policy() {
        let mut session = attached(ResizePolicy::Clear);
        scribble(&mut session);
        session.export().unwrap();

        let outcome = session.on_container_resize(ContainerBox::new(200, 80)).unwrap();
        assert!(!outcome.reapplied);
        assert_eq!(session.state(), SessionState::Empty);
        assert_eq!(session.surface().width(), 200);
        assert!(session.surface().is_blank());
    }

    #[test]
    fn test_resize_reapplies_last_known_when_enabled() {
        let mut session = attached(ResizePolicy::ReapplyLastKnown);
        scribble(&mut session);
        let before = session.surface().clone();
        session.export().unwrap();

        let outcome = session.on_container_resize(ContainerBox::new(120, 60)).unwrap();
        assert!(outcome.reapplied);
        assert_eq!(session.state(), SessionState::IdleWithContent);
        assert_eq!(session.surface(), &before);
    }

    #[test]
    fn test_reapply_without_export_loses_strokes() {
        let mut session = attached(ResizePolicy::ReapplyLastKnown);
        scribble(&mut session);
        let outcome = session.on_container_resize(ContainerBox::new(120, 60)).unwrap();
        assert!(!outcome.reapplied);
        assert!(session.surface().is_blank());
    }

    #[test]
    fn test_clear_forgets_last_known() {
        let mut session = attached(ResizePolicy::ReapplyLastKnown);
        scribble(&mut session);
        session.export().unwrap();
        session.clear();
        assert!(session.last_known().is_none());

        let outcome = session.on_container_resize(ContainerBox::new(120, 60)).unwrap();
        assert!(!outcome.reapplied);
        assert!(session.surface().is_blank());
    }

    #[test]
    fn test_restore_none_is_noop() {
        let mut session = attached(ResizePolicy::Clear);
        scribble(&mut session);
        let before = session.surface().clone();
        assert_eq!(session.restore(None).unwrap(), RestoreOutcome::Skipped);
        assert_eq!(session.surface(), &before);
        assert_eq!(session.state(), SessionState::IdleWithContent);
    }

    #[test]
    fn test_restore_failure_is_reported_and_harmless() {
        let mut session = attached(ResizePolicy::Clear);
        let bad = EncodedImage::from_data_url("data:image/png;base64,AAAA");
        let result = session.restore(Some(bad));
        assert!(matches!(result, Err(SignatureError::Codec(_))));
        assert!(session.surface().is_blank());
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.last_known().is_none());
    }

    #[test]
    fn test_stale_restore_is_superseded() {
        let mut source = attached(ResizePolicy::Clear);
        scribble(&mut source);
        let first = source.export().unwrap();
        source.clear();
        source.pointer_down(StrokePoint::new(100.0, 50.0));
        source.pointer_move(StrokePoint::new(110.0, 5.0));
        source.pointer_up();
        let second = source.export().unwrap();

        let mut target = attached(ResizePolicy::Clear);
        let older = target.request_restore(Some(first)).unwrap();
        let newer = target.request_restore(Some(second)).unwrap();
        assert!(newer.generation() > older.generation());

        // Newer finishes first, older limps in afterwards
        let decoded = newer.decode();
        assert_eq!(
            target.complete_restore(newer, decoded).unwrap(),
            RestoreOutcome::Applied
        );
        let decoded = older.decode();
        assert_eq!(
            target.complete_restore(older, decoded).unwrap(),
            RestoreOutcome::Superseded
        );
        assert_eq!(target.surface(), source.surface());
    }

    #[test]
    fn test_clear_supersedes_inflight_restore() {
        let mut source = attached(ResizePolicy::Clear);
        scribble(&mut source);
        let image = source.export().unwrap();

        let mut target = attached(ResizePolicy::Clear);
        let ticket = target.request_restore(Some(image)).unwrap();
        target.clear();
        let decoded = ticket.decode();
        assert_eq!(
            target.complete_restore(ticket, decoded).unwrap(),
            RestoreOutcome::Superseded
        );
        assert!(target.surface().is_blank());
    }

    #[test]
    fn test_restore_before_attach_is_not_applied() {
        let mut source = attached(ResizePolicy::Clear);
        scribble(&mut source);
        let image = source.export().unwrap();

        let mut target = CaptureSession::new("tech", SessionOptions::default());
        let result = target.restore(Some(image.clone()));
        assert!(matches!(result, Err(SignatureError::Detached)));
        assert_eq!(target.state(), SessionState::Detached);
        assert!(target.last_known().is_none());

        target.attach(ContainerBox::new(120, 60));
        assert_eq!(target.state(), SessionState::Empty);
        assert_eq!(target.restore(Some(image)).unwrap(), RestoreOutcome::Applied);
        assert_eq!(target.surface(), source.surface());
    }

    #[test]
    fn test_restore_after_resize_survives() {
        let mut source = attached(ResizePolicy::Clear);
        scribble(&mut source);
        let image = source.export().unwrap();

        let mut target = CaptureSession::new("tech", SessionOptions::default());
        target.attach(ContainerBox::new(0, 0));
        let ticket = target.request_restore(Some(image)).unwrap();
        // Layout settles before the decode lands
        target.on_container_resize(ContainerBox::new(120, 60));
        let decoded = ticket.decode();
        target.complete_restore(ticket, decoded).unwrap();
        assert_eq!(target.surface(), source.surface());
    }
}
