//! Signature pad bound to a `<canvas>`
//!
//! The pad sizes itself to the canvas' parent a short while after mounting
//! and again on every window resize. Restores resolve on a later turn of the
//! event loop, after the pad has settled.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use js_sys::{Function, Promise};
use signature_pad::{
    CaptureSession, CodecError, ContainerBox, EncodedImage, RestoreOutcome, SessionOptions,
    SessionState, SignatureError, StrokePoint, SurfaceOrigin,
};
use tracing::{debug, error, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local, JsFuture};
use web_sys::{CanvasRenderingContext2d, Event, HtmlCanvasElement, MouseEvent, TouchEvent};

use crate::canvas;
use crate::dom::{self, Listener};

struct PadState {
    session: CaptureSession,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    settled: bool,
    detached: bool,
    waiters: Vec<Function>,
    listeners: Vec<Listener>,
}

impl PadState {
    fn container(&self) -> ContainerBox {
        let (width, height) = match self.canvas.parent_element() {
            Some(parent) => (parent.client_width(), parent.client_height()),
            None => (self.canvas.client_width(), self.canvas.client_height()),
        };
        ContainerBox::new(width.max(0) as u32, height.max(0) as u32)
    }

    fn point(&self, event: &Event) -> Option<StrokePoint> {
        let rect = self.canvas.get_bounding_client_rect();
        let origin = SurfaceOrigin {
            left: rect.left() as f32,
            top: rect.top() as f32,
        };
        let (x, y) = if event.type_().starts_with("touch") {
            let touch = event.unchecked_ref::<TouchEvent>().touches().get(0)?;
            (touch.client_x(), touch.client_y())
        } else {
            let mouse = event.unchecked_ref::<MouseEvent>();
            (mouse.client_x(), mouse.client_y())
        };
        Some(StrokePoint::from_client(x as f32, y as f32, origin))
    }

    fn redraw(&self) {
        if let Err(e) = canvas::blit(&self.canvas, &self.ctx, self.session.surface()) {
            warn!(signer = %self.session.label(), error = ?e, "Failed to paint signature surface");
        }
    }

    fn pointer_down(&mut self, event: &Event) {
        if self.session.state() == SessionState::Detached {
            return;
        }
        event.prevent_default();
        if let Some(point) = self.point(event) {
            self.session.pointer_down(point);
        }
    }

    fn pointer_move(&mut self, event: &Event) {
        if self.session.state() != SessionState::Drawing {
            return;
        }
        event.prevent_default();
        if let Some(point) = self.point(event) {
            self.session.pointer_move(point);
            self.redraw();
        }
    }

    fn resize(&mut self) {
        let container = self.container();
        if let Some(outcome) = self.session.on_container_resize(container) {
            debug!(signer = %self.session.label(), ?outcome, "Signature pad resized");
            self.redraw();
        }
    }

    fn settle(&mut self) {
        if self.detached || self.settled {
            return;
        }
        let container = self.container();
        let outcome = self.session.attach(container);
        debug!(signer = %self.session.label(), ?outcome, "Signature pad settled");
        self.redraw();
        self.settled = true;
        for resolve in self.waiters.drain(..) {
            let _ = resolve.call0(&JsValue::NULL);
        }
    }
}

#[wasm_bindgen]
#[derive(Clone)]
pub struct SignaturePad {
    state: Rc<RefCell<PadState>>,
}

impl SignaturePad {
    /// Bind a pad to `canvas`; it settles after `settle_delay_ms`
    pub fn mount(
        canvas: HtmlCanvasElement,
        options: SessionOptions,
        settle_delay_ms: u32,
    ) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let state = PadState {
            session: CaptureSession::new(canvas.id(), options),
            canvas,
            ctx,
            settled: false,
            detached: false,
            waiters: Vec::new(),
            listeners: Vec::new(),
        };
        let pad = Self {
            state: Rc::new(RefCell::new(state)),
        };
        pad.install_listeners()?;

        let weak = Rc::downgrade(&pad.state);
        spawn_local(async move {
            if let Err(e) = dom::sleep(settle_delay_ms).await {
                warn!(error = ?e, "Settle timer failed; sizing pad immediately");
            }
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().settle();
            }
        });

        Ok(pad)
    }

    fn install_listeners(&self) -> Result<(), JsValue> {
        let canvas = self.state.borrow().canvas.clone();
        let window = dom::window()?;
        let weak = Rc::downgrade(&self.state);

        let mut listeners = Vec::with_capacity(7);
        listeners.push(Listener::add(&canvas, "mousedown", handler(&weak, PadState::pointer_down))?);
        listeners.push(Listener::add(&canvas, "mousemove", handler(&weak, PadState::pointer_move))?);
        listeners.push(Listener::add(&canvas, "mouseup", handler(&weak, |s, _| s.session.pointer_up()))?);
        listeners.push(Listener::add_non_passive(
            &canvas,
            "touchstart",
            handler(&weak, PadState::pointer_down),
        )?);
        listeners.push(Listener::add_non_passive(
            &canvas,
            "touchmove",
            handler(&weak, PadState::pointer_move),
        )?);
        listeners.push(Listener::add(&canvas, "touchend", handler(&weak, |s, _| s.session.pointer_up()))?);
        listeners.push(Listener::add(&window, "resize", handler(&weak, |s, _| s.resize()))?);

        self.state.borrow_mut().listeners = listeners;
        Ok(())
    }

    pub fn canvas_id(&self) -> String {
        self.state.borrow().canvas.id()
    }

    /// Current pixels as an image; `None` when the pad has no area yet
    pub fn export_image(&self) -> Option<EncodedImage> {
        let mut state = self.state.borrow_mut();
        let label = state.session.label().to_string();
        match state.session.export() {
            Ok(image) => Some(image),
            Err(SignatureError::Detached) | Err(SignatureError::Codec(CodecError::ZeroArea { .. })) => {
                warn!(signer = %label, "Signature pad has no area; saving without signature");
                None
            }
            Err(e) => {
                error!(signer = %label, error = %e, "Failed to export signature");
                None
            }
        }
    }

    /// Draw a stored image once decoded and once the pad has settled. The
    /// restore is registered when this is called, so a later restore or a
    /// clear wins over this one.
    pub fn restore_image(
        &self,
        image: Option<EncodedImage>,
    ) -> impl Future<Output = Result<RestoreOutcome, SignatureError>> {
        let ticket = self.state.borrow_mut().session.request_restore(image);
        let pad = self.clone();
        async move {
            let Some(ticket) = ticket else {
                return Ok(RestoreOutcome::Skipped);
            };

            // Settling resizes and clears the surface; drawing must come after
            pad.wait_settled().await;
            // Yield like an image load would
            if let Err(e) = dom::sleep(0).await {
                debug!(error = ?e, "Restore timer failed; decoding right away");
            }

            let decoded = ticket.decode();
            let mut state = pad.state.borrow_mut();
            let outcome = state.session.complete_restore(ticket, decoded)?;
            if outcome == RestoreOutcome::Applied {
                state.redraw();
            }
            Ok(outcome)
        }
    }

    /// Resolves once the pad has been sized to its container
    pub async fn wait_settled(&self) {
        if let Err(e) = JsFuture::from(self.settled()).await {
            warn!(error = ?e, "Waiting for signature pad failed");
        }
    }
}

#[wasm_bindgen]
impl SignaturePad {
    /// Pad over the canvas with id `canvas_id`, default pen and policy
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<SignaturePad, JsValue> {
        let canvas = dom::get_element::<HtmlCanvasElement>(&dom::document()?, canvas_id)?;
        Self::mount(canvas, SessionOptions::default(), 100)
    }

    /// Erase the pad
    #[wasm_bindgen]
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.session.clear();
        state.redraw();
    }

    /// PNG data URL of the current pixels, or `undefined`
    #[wasm_bindgen(js_name = toDataUrl)]
    pub fn to_data_url(&self) -> Option<String> {
        self.export_image().map(EncodedImage::into_string)
    }

    /// Draw a PNG data URL; resolves to `"applied"`, `"skipped"` or `"superseded"`
    #[wasm_bindgen]
    pub fn restore(&self, data_url: Option<String>) -> Promise {
        let pending = self.restore_image(data_url.map(EncodedImage::from_data_url));
        future_to_promise(async move {
            let outcome = pending
                .await
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            let label = match outcome {
                RestoreOutcome::Applied => "applied",
                RestoreOutcome::Skipped => "skipped",
                RestoreOutcome::Superseded => "superseded",
            };
            Ok(JsValue::from_str(label))
        })
    }

    /// Promise resolved once the pad has been sized to its container or
    /// detached
    #[wasm_bindgen]
    pub fn settled(&self) -> Promise {
        let state = self.state.clone();
        Promise::new(&mut |resolve, _reject| {
            let mut state = state.borrow_mut();
            if state.settled || state.detached {
                let _ = resolve.call0(&JsValue::NULL);
            } else {
                state.waiters.push(resolve);
            }
        })
    }

    #[wasm_bindgen(getter, js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        !matches!(
            self.state.borrow().session.state(),
            SessionState::IdleWithContent | SessionState::Drawing
        )
    }

    /// Remove every listener and stop accepting input
    #[wasm_bindgen]
    pub fn detach(&self) {
        let mut state = self.state.borrow_mut();
        state.detached = true;
        for listener in state.listeners.drain(..) {
            listener.remove();
        }
        state.session.detach();
        for resolve in state.waiters.drain(..) {
            let _ = resolve.call0(&JsValue::NULL);
        }
    }
}

fn handler(
    weak: &Weak<RefCell<PadState>>,
    action: fn(&mut PadState, &Event),
) -> Closure<dyn FnMut(Event)> {
    let weak = weak.clone();
    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        if let Some(state) = weak.upgrade() {
            action(&mut state.borrow_mut(), &event);
        }
    })
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn canvas_in_box(id: &str, width: u32, height: u32) -> HtmlCanvasElement {
        let document = dom::document().unwrap();
        let parent = document.create_element("div").unwrap();
        parent
            .set_attribute("style", &format!("width:{}px;height:{}px", width, height))
            .unwrap();
        let canvas: HtmlCanvasElement = document.create_element("canvas").unwrap().dyn_into().unwrap();
        canvas.set_id(id);
        parent.append_child(&canvas).unwrap();
        document.body().unwrap().append_child(&parent).unwrap();
        canvas
    }

    #[wasm_bindgen_test]
    async fn test_pad_settles_to_container() {
        let canvas = canvas_in_box("pad-settle", 240, 80);
        let pad = SignaturePad::mount(canvas.clone(), SessionOptions::default(), 0).unwrap();
        pad.wait_settled().await;

        assert_eq!((canvas.width(), canvas.height()), (240, 80));
        assert!(pad.is_empty());
        assert!(pad.to_data_url().unwrap().starts_with("data:image/png;base64,"));
        pad.detach();
    }

    #[wasm_bindgen_test]
    async fn test_restore_after_settle_marks_content() {
        let source = canvas_in_box("pad-source", 100, 50);
        let source = SignaturePad::mount(source, SessionOptions::default(), 0).unwrap();
        source.wait_settled().await;
        {
            let mut state = source.state.borrow_mut();
            state.session.pointer_down(StrokePoint::new(5.0, 5.0));
            state.session.pointer_move(StrokePoint::new(60.0, 30.0));
            state.session.pointer_up();
        }
        let image = source.export_image();

        let target = canvas_in_box("pad-target", 100, 50);
        let target = SignaturePad::mount(target, SessionOptions::default(), 0).unwrap();
        target.wait_settled().await;
        let outcome = target.restore_image(image).await.unwrap();

        assert_eq!(outcome, RestoreOutcome::Applied);
        assert!(!target.is_empty());
        source.detach();
        target.detach();
    }

    #[wasm_bindgen_test]
    async fn test_restore_before_settle_lands_after_sizing() {
        let source = canvas_in_box("pad-early-source", 100, 50);
        let source = SignaturePad::mount(source, SessionOptions::default(), 0).unwrap();
        source.wait_settled().await;
        {
            let mut state = source.state.borrow_mut();
            state.session.pointer_down(StrokePoint::new(5.0, 5.0));
            state.session.pointer_move(StrokePoint::new(60.0, 30.0));
            state.session.pointer_up();
        }
        let image = source.export_image();

        let canvas = canvas_in_box("pad-early-target", 100, 50);
        let target = SignaturePad::mount(canvas.clone(), SessionOptions::default(), 20).unwrap();
        let pending = target.restore_image(image);
        let outcome = pending.await.unwrap();

        assert_eq!(outcome, RestoreOutcome::Applied);
        assert_eq!((canvas.width(), canvas.height()), (100, 50));
        assert!(!target.is_empty());
        source.detach();
        target.detach();
    }

    #[wasm_bindgen_test]
    async fn test_clear_supersedes_pending_restore() {
        let canvas = canvas_in_box("pad-clear", 100, 50);
        let pad = SignaturePad::mount(canvas, SessionOptions::default(), 0).unwrap();
        pad.wait_settled().await;
        let image = pad.export_image();

        let pending = pad.restore_image(image);
        pad.clear();
        assert_eq!(pending.await.unwrap(), RestoreOutcome::Superseded);
        pad.detach();
    }
}
