//! Form pages
//!
//! [`FormsApp`] owns the one [`AppContext`] of the page and mounts a
//! [`FormPage`] per form. The page reads and writes inputs through the form
//! schema, wires signature pads and the save button, and loads `?id=` after
//! the pads have settled.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use form_records::dates::{date_stamp, iso_date, today};
use form_records::forms::{material_field_id, JOB_TYPE_FIELD};
use form_records::schema::FieldKind;
use form_records::{
    guard, list_documents, load_document, save_document, AppConfig, AppContext, DateTarget, Delivery,
    DocType, DocumentId, FormDefinition, FormSchema, FormValues, InputValue, LoadedDocument,
    SignerRole, Signatures,
};
use js_sys::Promise;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{Document, Element, HtmlAnchorElement, HtmlCanvasElement, HtmlInputElement};

use crate::dom::{self, Listener};
use crate::pad::SignaturePad;
use crate::pdf::Html2Pdf;
use crate::store::RestStore;

type Context = AppContext<RestStore, Html2Pdf>;

const MATERIALS_BODY_ID: &str = "materials-body";
const SUCCESS_MODAL_ID: &str = "success-modal";
const EMAIL_LINK_ID: &str = "email-btn-link";

#[wasm_bindgen]
pub struct FormsApp {
    ctx: Rc<Context>,
}

#[wasm_bindgen]
impl FormsApp {
    /// Build the app from a plain config object
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<FormsApp, JsValue> {
        let config: AppConfig = serde_wasm_bindgen::from_value(config)?;
        let ctx = AppContext::new(config.clone(), RestStore::new(&config), Html2Pdf)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        info!(store = %config.store_base(), "Forms app initialized");
        Ok(Self { ctx: Rc::new(ctx) })
    }

    /// Mount the page for a stored type tag such as `"Arbeitsnachweis"`
    #[wasm_bindgen]
    pub fn page(&self, doc_type: &str) -> Result<FormPage, JsValue> {
        let doc_type: DocType = serde_json::from_value(serde_json::Value::from(doc_type))
            .map_err(|_| JsValue::from_str(&format!("Unknown form type: {}", doc_type)))?;
        FormPage::mount(self.ctx.clone(), FormDefinition::for_doc_type(doc_type))
    }

    /// Send signed-out visitors to the login page and signed-in visitors
    /// away from it. Returns whether a redirect was issued.
    #[wasm_bindgen(js_name = guardNavigation)]
    pub fn guard_navigation(&self) -> Result<bool, JsValue> {
        let location = dom::window()?.location();
        let href = location.href()?;
        let has_session = self.ctx.store().access_token().is_some();
        match guard(has_session, &href) {
            Some(redirect) => {
                info!(to = redirect.target(), "Redirecting");
                location.set_href(redirect.target())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Archive rows, newest first; empty on errors
    #[wasm_bindgen(js_name = listDocuments)]
    pub fn list_documents(&self) -> Promise {
        let ctx = self.ctx.clone();
        future_to_promise(async move {
            let rows = list_documents(&ctx).await;
            Ok(serde_wasm_bindgen::to_value(&rows)?)
        })
    }
}

struct PageState {
    ctx: Rc<Context>,
    form: FormDefinition,
    document: Document,
    pads: BTreeMap<SignerRole, SignaturePad>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
#[derive(Clone)]
pub struct FormPage {
    state: Rc<RefCell<PageState>>,
}

impl FormPage {
    pub fn mount(ctx: Rc<Context>, form: FormDefinition) -> Result<Self, JsValue> {
        let document = dom::document()?;

        let mut pads = BTreeMap::new();
        for role in form.signer_roles {
            match document.get_element_by_id(role.canvas_id()) {
                Some(element) => {
                    let canvas = element.dyn_into::<HtmlCanvasElement>()?;
                    let pad = SignaturePad::mount(
                        canvas,
                        ctx.config().session_options(),
                        ctx.config().settle_delay_ms,
                    )?;
                    pads.insert(*role, pad);
                }
                None => warn!(canvas = role.canvas_id(), "Signature canvas missing on page"),
            }
        }

        let page = Self {
            state: Rc::new(RefCell::new(PageState {
                ctx,
                form,
                document,
                pads,
                listeners: Vec::new(),
            })),
        };

        page.stamp_date();
        page.wire_clear_buttons()?;
        page.wire_job_type()?;
        page.wire_save_button()?;

        if let Some(id) = dom::query_param("id").filter(|id| !id.is_empty()) {
            let page = page.clone();
            spawn_local(async move { page.load_after_settle(DocumentId::new(id)).await });
        }

        Ok(page)
    }

    fn stamp_date(&self) {
        let state = self.state.borrow();
        let today = today();
        match state.form.date_target {
            DateTarget::Input(id) => {
                if let Ok(input) = dom::get_element::<HtmlInputElement>(&state.document, id) {
                    if input.value().is_empty() {
                        input.set_value(&iso_date(today));
                    }
                }
            }
            DateTarget::Text(id) => {
                if let Some(element) = state.document.get_element_by_id(id) {
                    element.set_text_content(Some(&date_stamp(today)));
                }
            }
        }
    }

    fn wire_clear_buttons(&self) -> Result<(), JsValue> {
        let buttons = self.state.borrow().document.query_selector_all("[data-clear]")?;
        for i in 0..buttons.length() {
            let Some(button) = buttons.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let canvas_id = button.get_attribute("data-clear").unwrap_or_default();
            let pad = {
                let state = self.state.borrow();
                let by_id = state.pads.values().find(|pad| pad.canvas_id() == canvas_id).cloned();
                // A single pad is cleared by any clear button
                by_id.or_else(|| {
                    (state.pads.len() == 1)
                        .then(|| state.pads.values().next().cloned())
                        .flatten()
                })
            };
            let Some(pad) = pad else {
                warn!(%canvas_id, "Clear button without matching signature pad");
                continue;
            };
            let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| pad.clear());
            let listener = Listener::add(&button, "click", callback)?;
            self.state.borrow_mut().listeners.push(listener);
        }
        Ok(())
    }

    fn wire_job_type(&self) -> Result<(), JsValue> {
        let select = {
            let state = self.state.borrow();
            if state.form.doc_type != DocType::WorkReport {
                return Ok(());
            }
            match state.document.get_element_by_id(JOB_TYPE_FIELD) {
                Some(select) => select,
                None => return Ok(()),
            }
        };
        let weak = Rc::downgrade(&self.state);
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
            if let Some(state) = weak.upgrade() {
                let state = state.borrow();
                let job_type = state
                    .document
                    .get_element_by_id(JOB_TYPE_FIELD)
                    .and_then(|el| dom::read_value(&el));
                if let Err(e) = render_materials(&state, job_type.as_deref()) {
                    warn!(error = ?e, "Failed to render material rows");
                }
            }
        });
        let listener = Listener::add(&select, "change", callback)?;
        self.state.borrow_mut().listeners.push(listener);
        Ok(())
    }

    fn wire_save_button(&self) -> Result<(), JsValue> {
        let button = {
            let state = self.state.borrow();
            match state.document.get_element_by_id(state.form.save_button_id) {
                Some(button) => button,
                None => {
                    warn!(id = state.form.save_button_id, "Save button missing on page");
                    return Ok(());
                }
            }
        };
        let page = Rc::downgrade(&self.state);
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
            if let Some(state) = page.upgrade() {
                let page = FormPage { state };
                spawn_local(async move { page.save_and_report().await });
            }
        });
        let listener = Listener::add(&button, "click", callback)?;
        self.state.borrow_mut().listeners.push(listener);
        Ok(())
    }

    /// Current page values for the form's schema
    pub fn collect_values(&self) -> FormValues {
        let state = self.state.borrow();
        let job_type = state
            .document
            .get_element_by_id(JOB_TYPE_FIELD)
            .and_then(|el| dom::read_value(&el));
        let schema = state.form.schema_for_job(job_type.as_deref());
        read_values(&state.document, &schema)
    }

    fn collect_signatures(&self) -> Signatures {
        let state = self.state.borrow();
        let mut signatures = Signatures::default();
        for (role, pad) in &state.pads {
            signatures.set(*role, pad.export_image());
        }
        signatures
    }

    async fn save_and_report(&self) {
        let values = self.collect_values();
        let signatures = self.collect_signatures();
        let (ctx, form) = {
            let state = self.state.borrow();
            (state.ctx.clone(), state.form.clone())
        };

        match save_document(&ctx, &form, &values, signatures).await {
            Ok(outcome) => {
                if let Some(message) = outcome.alert_text(&form) {
                    dom::alert(&message);
                }
                if let Delivery::Ready { mailto } = &outcome.delivery {
                    self.show_success(mailto);
                }
            }
            Err(e) => {
                warn!(error = %e, "Save failed");
                dom::alert(&e.alert_text());
            }
        }
    }

    fn show_success(&self, mailto: &str) {
        let state = self.state.borrow();
        if let Ok(link) = dom::get_element::<HtmlAnchorElement>(&state.document, EMAIL_LINK_ID) {
            link.set_href(mailto);
        }
        if let Some(modal) = state.document.get_element_by_id(SUCCESS_MODAL_ID) {
            let _ = modal.class_list().add_1("active");
        }
    }

    async fn load_after_settle(&self, id: DocumentId) {
        let load_delay_ms = self.state.borrow().ctx.config().load_delay_ms;
        if let Err(e) = dom::sleep(load_delay_ms).await {
            warn!(error = ?e, "Load delay timer failed");
        }
        if let Err(message) = self.load_into_page(&id).await {
            dom::alert(&message);
        }
    }

    /// Resolves once every pad has been sized to its container
    async fn pads_settled(&self) {
        let pads: Vec<SignaturePad> = self.state.borrow().pads.values().cloned().collect();
        for pad in &pads {
            pad.wait_settled().await;
        }
    }

    /// Load a stored document into the page once the pads have settled;
    /// `Err` carries the alert text
    async fn load_into_page(&self, id: &DocumentId) -> Result<(), String> {
        self.pads_settled().await;
        let (ctx, form) = {
            let state = self.state.borrow();
            (state.ctx.clone(), state.form.clone())
        };
        let loaded = load_document(&ctx, &form, id)
            .await
            .map_err(|e| e.alert_text())?;
        self.apply(loaded).await;
        Ok(())
    }

    async fn apply(&self, loaded: LoadedDocument) {
        let restores: Vec<_> = {
            let state = self.state.borrow();

            // Job type first: it decides which material rows exist
            if let Some(job_type) = loaded.values.text(JOB_TYPE_FIELD) {
                if let Some(select) = state.document.get_element_by_id(JOB_TYPE_FIELD) {
                    dom::write_value(&select, job_type);
                }
                if let Err(e) = render_materials(&state, Some(job_type)) {
                    warn!(error = ?e, "Failed to render material rows");
                }
            }
            let schema = state.form.schema_for_job(loaded.values.text(JOB_TYPE_FIELD));
            write_values(&state.document, &schema, &loaded.values);

            state
                .pads
                .iter()
                .map(|(role, pad)| (*role, pad.restore_image(loaded.signatures.get(*role).cloned())))
                .collect()
        };

        for (role, pending) in restores {
            if let Err(e) = pending.await {
                warn!(signer = role.as_str(), error = %e, "Stored signature could not be restored");
            }
        }
        info!(id = %loaded.id, "Document applied to page");
    }
}

#[wasm_bindgen]
impl FormPage {
    /// Values as a plain object keyed by field id
    #[wasm_bindgen(js_name = values)]
    pub fn values_js(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.collect_values())?)
    }

    /// Run the save flow as if the save button was clicked
    #[wasm_bindgen]
    pub fn save(&self) -> Promise {
        let page = self.clone();
        future_to_promise(async move {
            page.save_and_report().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Load a stored document; rejects with the alert text
    #[wasm_bindgen]
    pub fn load(&self, id: String) -> Promise {
        let page = self.clone();
        future_to_promise(async move {
            page.load_into_page(&DocumentId::new(id))
                .await
                .map(|_| JsValue::UNDEFINED)
                .map_err(|message| JsValue::from_str(&message))
        })
    }

    #[wasm_bindgen(js_name = closeModal)]
    pub fn close_modal(&self) {
        if let Some(modal) = self.state.borrow().document.get_element_by_id(SUCCESS_MODAL_ID) {
            let _ = modal.class_list().remove_1("active");
        }
    }

    /// Signature pad of `"tech"` or `"customer"`
    #[wasm_bindgen]
    pub fn pad(&self, role: &str) -> Option<SignaturePad> {
        let role = match role {
            "tech" => SignerRole::Tech,
            "customer" => SignerRole::Customer,
            _ => return None,
        };
        self.state.borrow().pads.get(&role).cloned()
    }

    /// Remove page listeners and detach the pads
    #[wasm_bindgen]
    pub fn detach(&self) {
        let mut state = self.state.borrow_mut();
        for listener in state.listeners.drain(..) {
            listener.remove();
        }
        for pad in state.pads.values() {
            pad.detach();
        }
    }
}

fn read_values(document: &Document, schema: &FormSchema) -> FormValues {
    let mut values = FormValues::new();
    for field in schema.fields() {
        match &field.kind {
            FieldKind::Checkbox => {
                if let Ok(input) = dom::get_element::<HtmlInputElement>(document, &field.id) {
                    values.set_toggle(field.id.clone(), input.checked());
                }
            }
            FieldKind::Radio { group, value } => {
                if let Some(input) = radio_input(document, group, value) {
                    values.set_toggle(field.id.clone(), input.checked());
                }
            }
            _ => {
                if let Some(text) = document
                    .get_element_by_id(&field.id)
                    .and_then(|el| dom::read_value(&el))
                {
                    values.set_text(field.id.clone(), text);
                }
            }
        }
    }
    values
}

fn write_values(document: &Document, schema: &FormSchema, values: &FormValues) {
    for field in schema.fields() {
        let Some(value) = values.get(&field.id) else {
            continue;
        };
        match (&field.kind, value) {
            (FieldKind::Checkbox, InputValue::Toggle(checked)) => {
                if let Ok(input) = dom::get_element::<HtmlInputElement>(document, &field.id) {
                    input.set_checked(*checked);
                }
            }
            (FieldKind::Radio { group, value }, InputValue::Toggle(checked)) => {
                if let Some(input) = radio_input(document, group, value) {
                    input.set_checked(*checked);
                }
            }
            (_, InputValue::Text(text)) => {
                if let Some(element) = document.get_element_by_id(&field.id) {
                    dom::write_value(&element, text);
                }
            }
            _ => {}
        }
    }
}

fn radio_input(document: &Document, group: &str, value: &str) -> Option<HtmlInputElement> {
    let selector = format!(r#"input[type="radio"][name="{}"][value="{}"]"#, group, value);
    document
        .query_selector(&selector)
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
}

/// Rebuild the material rows for a job type
fn render_materials(state: &PageState, job_type: Option<&str>) -> Result<(), JsValue> {
    let Some(body) = state.document.get_element_by_id(MATERIALS_BODY_ID) else {
        return Ok(());
    };
    body.set_inner_html("");

    let materials = state.form.materials_for(job_type);
    if materials.is_empty() {
        let placeholder = state.document.create_element("div")?;
        placeholder.set_class_name("materials-placeholder");
        placeholder.set_text_content(Some("Keine Materialliste."));
        body.append_child(&placeholder)?;
        return Ok(());
    }

    for (index, item) in materials.iter().enumerate() {
        let row = state.document.create_element("div")?;
        row.set_class_name("material-row");

        let label = state.document.create_element("div")?;
        label.set_class_name("material-label");
        label.set_text_content(Some(item.label));

        let input = state.document.create_element("input")?;
        input.set_class_name("material-input");
        input.set_id(&material_field_id(index));
        input.set_attribute("type", "number")?;
        input.set_attribute("placeholder", "0")?;

        let unit = state.document.create_element("div")?;
        unit.set_class_name("material-unit");
        unit.set_text_content(Some(item.unit));

        row.append_child(&label)?;
        row.append_child(&input)?;
        row.append_child(&unit)?;
        body.append_child(&row)?;
    }
    Ok(())
}
