#![allow(non_snake_case)]

use dioxus::prelude::*;

// Modules
mod components;
mod context;
mod hooks;
mod routes;
mod services;
mod stores;
mod utils;

use context::AppContext;
use stores::app_config::AppConfig;

fn main() {
    // Initialize panic hook for better error messages in browser console
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    }

    log::info!("Starting photoshare");

    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    // Build the document store once and share it with every component
    use_context_provider(|| AppContext::new(AppConfig::load()));

    rsx! {
        Router::<routes::Route> {}
    }
}
