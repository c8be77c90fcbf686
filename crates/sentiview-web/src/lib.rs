#![forbid(unsafe_code)]

//! WASM frontend for Sentiview.
//!
//! Wraps `sentiview-core` with the pieces that need a real host:
//! - an HTTP [`AnalysisEndpoint`](sentiview_core::AnalysisEndpoint) over `reqwest`,
//! - a `web-sys` implementation of the core `Dom` trait,
//! - a `wasm-bindgen` page object that wires the input form, pumps the fade
//!   queue with `setTimeout`, and awaits the endpoint without holding the DOM.

pub mod endpoint;
pub mod logging;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use endpoint::{HttpEndpoint, resolve_endpoint_url};

#[cfg(target_arch = "wasm32")]
pub use wasm::{DomError, SentiviewPage, WebDom};

/// Native builds compile this crate as a stub so `cargo check --workspace` stays
/// green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct SentiviewPage {
    config: sentiview_core::PageConfig,
}

#[cfg(not(target_arch = "wasm32"))]
impl SentiviewPage {
    #[must_use]
    pub fn new(config: sentiview_core::PageConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &sentiview_core::PageConfig {
        &self.config
    }
}
