//! Field forms in the browser
//!
//! Signature pads, the three form pages and the REST document store, exported
//! to JavaScript.
//!
//! ```js
//! import init, { FormsApp } from "./pkg/fieldforms_wasm.js";
//! await init();
//! const app = new FormsApp({ storeUrl, anonKey, mailRecipient });
//! if (!app.guardNavigation()) {
//!   const page = app.page("Arbeitsnachweis");
//! }
//! ```

use wasm_bindgen::prelude::*;

pub mod canvas;
pub mod dom;
pub mod logging;
pub mod pad;
pub mod page;
pub mod pdf;
pub mod store;

pub use pad::SignaturePad;
pub use page::{FormPage, FormsApp};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logging::init(logging::DEFAULT_LEVEL);
    tracing::info!("Field forms WASM initialized");
}
