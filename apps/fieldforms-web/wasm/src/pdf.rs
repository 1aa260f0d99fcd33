//! PDF export through the page's `html2pdf` bundle
//!
//! `html2pdf().set(options).from(element).save()` returns a thenable worker,
//! adopted here into a real promise.

use form_records::{PdfOptions, PdfRenderer, RenderError};
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::dom;

#[derive(Debug, Default, Clone, Copy)]
pub struct Html2Pdf;

fn html2pdf_fn() -> Option<Function> {
    let window = web_sys::window()?;
    Reflect::get(&window, &JsValue::from_str("html2pdf"))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

fn render_error(e: JsValue) -> RenderError {
    let message = Reflect::get(&e, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| e.as_string())
        .unwrap_or_else(|| format!("{:?}", e));
    RenderError(message)
}

/// `target.name(arg)` for a chained worker call
fn call_method(target: &JsValue, name: &str, arg: &JsValue) -> Result<JsValue, JsValue> {
    let method = Reflect::get(target, &JsValue::from_str(name))?.dyn_into::<Function>()?;
    method.call1(target, arg)
}

impl PdfRenderer for Html2Pdf {
    fn is_available(&self) -> bool {
        html2pdf_fn().is_some()
    }

    async fn render(&self, target_id: &str, options: &PdfOptions) -> Result<(), RenderError> {
        let factory =
            html2pdf_fn().ok_or_else(|| RenderError("html2pdf is not loaded".to_string()))?;
        let element = dom::document()
            .map_err(render_error)?
            .get_element_by_id(target_id)
            .ok_or_else(|| RenderError(format!("Missing element #{}", target_id)))?;
        let options = options
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| RenderError(e.to_string()))?;

        let worker = factory.call0(&JsValue::NULL).map_err(render_error)?;
        let worker = call_method(&worker, "set", &options).map_err(render_error)?;
        let worker = call_method(&worker, "from", &element).map_err(render_error)?;
        let saving = call_method(&worker, "save", &JsValue::UNDEFINED).map_err(render_error)?;

        JsFuture::from(Promise::resolve(&saving))
            .await
            .map_err(render_error)?;
        Ok(())
    }
}
