#![recursion_limit = "256"]

pub mod app;
pub mod components;
pub mod error_template;
pub mod models;
pub mod server_fn;
pub mod state;
pub mod upstream;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::*;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
