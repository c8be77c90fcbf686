#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use js_sys::{Function, Promise};
use sentiview_core::{
    AnalysisEndpoint, AnalysisWorkflow, Dom, ElementIds, MonotonicClock, PageConfig, PageHandles,
    Submission, ViewStateController,
};
use tracing::{error, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement, Window};
use web_time::Instant;

use crate::endpoint::HttpEndpoint;
use crate::logging;

/// A failed browser DOM call, carrying the JS error's message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DomError(String);

impl From<JsValue> for DomError {
    fn from(value: JsValue) -> Self {
        Self(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn as_html(node: &Element) -> Result<&HtmlElement, DomError> {
    node.dyn_ref::<HtmlElement>()
        .ok_or_else(|| DomError(format!("<{}> is not an HTML element", node.tag_name())))
}

/// [`Dom`] over the live browser document.
pub struct WebDom {
    document: Document,
}

impl WebDom {
    #[must_use]
    pub const fn new(document: Document) -> Self {
        Self { document }
    }

    fn by_id(&self, id: &str) -> Result<Element, DomError> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| DomError(format!("missing element #{id}")))
    }

    /// Look up the four pre-existing page elements.
    pub fn handles(&self, ids: &ElementIds) -> Result<PageHandles<Element>, DomError> {
        Ok(PageHandles {
            input_form: self.by_id(&ids.input_form)?,
            channel_input: self.by_id(&ids.channel_input)?,
            start_page: self.by_id(&ids.start_page)?,
            content: self.by_id(&ids.content)?,
        })
    }
}

impl Dom for WebDom {
    type Node = Element;
    type Error = DomError;

    fn create_element(&mut self, tag: &str) -> Result<Element, DomError> {
        Ok(self.document.create_element(tag)?)
    }

    fn set_id(&mut self, node: &Element, id: &str) -> Result<(), DomError> {
        node.set_id(id);
        Ok(())
    }

    fn set_class(&mut self, node: &Element, class: &str) -> Result<(), DomError> {
        node.set_class_name(class);
        Ok(())
    }

    fn set_text(&mut self, node: &Element, text: &str) -> Result<(), DomError> {
        node.set_text_content(Some(text));
        Ok(())
    }

    fn set_style(&mut self, node: &Element, property: &str, value: &str) -> Result<(), DomError> {
        as_html(node)?.style().set_property(property, value)?;
        Ok(())
    }

    fn style(&self, node: &Element, property: &str) -> Result<Option<String>, DomError> {
        let value = as_html(node)?.style().get_property_value(property)?;
        Ok((!value.is_empty()).then_some(value))
    }

    fn append_child(&mut self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent.append_child(child)?;
        Ok(())
    }

    fn remove(&mut self, node: &Element) -> Result<(), DomError> {
        node.remove();
        Ok(())
    }

    fn input_value(&self, node: &Element) -> Result<String, DomError> {
        node.dyn_ref::<HtmlInputElement>()
            .map(HtmlInputElement::value)
            .ok_or_else(|| DomError(format!("<{}> is not an input", node.tag_name())))
    }

    fn is_attached(&self, node: &Element) -> Result<bool, DomError> {
        Ok(node.is_connected())
    }
}

/// Monotonic time since the page object was created.
struct WebClock {
    origin: Instant,
}

impl MonotonicClock for WebClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

struct PageState {
    window: Window,
    dom: WebDom,
    form: Element,
    workflow: AnalysisWorkflow<Element>,
    clock: WebClock,
    timer: Option<i32>,
    listener: Option<Closure<dyn FnMut(Event)>>,
}

fn with_page<T>(
    state: &RefCell<PageState>,
    f: impl FnOnce(&mut PageState) -> Result<T, JsValue>,
) -> Result<T, JsValue> {
    let mut page = state
        .try_borrow_mut()
        .map_err(|_| JsValue::from_str("sentiview page is busy"))?;
    f(&mut page)
}

/// Fire due fades, then re-arm the timer for whatever is left.
fn pump(state: &Rc<RefCell<PageState>>) -> Result<(), JsValue> {
    with_page(state, |page| {
        page.timer = None;
        let now = page.clock.now_mono();
        page.workflow.tick(&mut page.dom, now).map_err(to_js)?;
        Ok(())
    })?;
    schedule_pump(state)
}

fn schedule_pump(state: &Rc<RefCell<PageState>>) -> Result<(), JsValue> {
    let weak = Rc::downgrade(state);
    with_page(state, |page| {
        if let Some(handle) = page.timer.take() {
            page.window.clear_timeout_with_handle(handle);
        }
        let Some(due) = page.workflow.view().next_due() else {
            return Ok(());
        };
        let wait = due.saturating_sub(page.clock.now_mono());
        let wait_ms = i32::try_from(wait.as_micros().div_ceil(1_000)).unwrap_or(i32::MAX);
        let callback = Closure::once_into_js(move || {
            if let Some(state) = weak.upgrade()
                && let Err(err) = pump(&state)
            {
                error!(error = ?err, "fade pump failed");
            }
        });
        let handle = page
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref::<Function>(), wait_ms)?;
        page.timer = Some(handle);
        Ok(())
    })
}

fn submit(state: Weak<RefCell<PageState>>, endpoint: Rc<HttpEndpoint>) -> Promise {
    future_to_promise(async move {
        let Some(page_state) = state.upgrade() else {
            return Ok(JsValue::UNDEFINED);
        };
        let submission = with_page(&page_state, |page| {
            let now = page.clock.now_mono();
            page.workflow.submit(&mut page.dom, now).map_err(to_js)
        })?;
        schedule_pump(&page_state)?;
        let Submission::Request(request) = submission else {
            return Ok(JsValue::UNDEFINED);
        };
        // The page is not borrowed while the request is in flight.
        drop(page_state);
        let result = endpoint.analyze(&request).await;

        let Some(page_state) = state.upgrade() else {
            return Ok(JsValue::UNDEFINED);
        };
        let outcome = with_page(&page_state, |page| {
            let now = page.clock.now_mono();
            page.workflow.complete(&mut page.dom, now, result).map_err(to_js)
        })?;
        schedule_pump(&page_state)?;
        Ok(JsValue::from_str(outcome.kind()))
    })
}

fn parse_config(options: Option<JsValue>) -> Result<PageConfig, JsValue> {
    let Some(options) = options.filter(|v| !v.is_undefined() && !v.is_null()) else {
        return Ok(PageConfig::default());
    };
    let json = String::from(js_sys::JSON::stringify(&options)?);
    PageConfig::from_json_str(&json).map_err(to_js)
}

/// The sentiment page, as seen from JS.
///
/// ```js
/// const page = new SentiviewPage({ endpoint_url: "/analyze" });
/// page.bindForm();
/// ```
#[wasm_bindgen]
pub struct SentiviewPage {
    state: Rc<RefCell<PageState>>,
    endpoint: Rc<HttpEndpoint>,
}

#[wasm_bindgen]
impl SentiviewPage {
    /// Look up the page elements and build the controller. `options` is a
    /// plain object with the `PageConfig` fields; missing fields use defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<JsValue>) -> Result<SentiviewPage, JsValue> {
        let config = parse_config(options)?;
        logging::init_tracing(&config.log_filter);

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        let origin = window.location().origin()?;
        let endpoint = HttpEndpoint::from_config(&config, Some(&origin)).map_err(to_js)?;

        let dom = WebDom::new(document);
        let handles = dom.handles(&config.ids).map_err(to_js)?;
        let form = handles.input_form.clone();
        let workflow = AnalysisWorkflow::new(ViewStateController::from_config(handles, &config));
        info!(endpoint = %endpoint.url(), "sentiview page ready");

        Ok(Self {
            state: Rc::new(RefCell::new(PageState {
                window,
                dom,
                form,
                workflow,
                clock: WebClock {
                    origin: Instant::now(),
                },
                timer: None,
                listener: None,
            })),
            endpoint: Rc::new(endpoint),
        })
    }

    /// Attach a `submit` listener to the input form. Replaces any previous one.
    #[wasm_bindgen(js_name = bindForm)]
    pub fn bind_form(&self) -> Result<(), JsValue> {
        let weak = Rc::downgrade(&self.state);
        let endpoint = Rc::clone(&self.endpoint);
        let listener = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            event.prevent_default();
            let _ = submit(weak.clone(), Rc::clone(&endpoint));
        });
        with_page(&self.state, |page| {
            page.form
                .add_event_listener_with_callback("submit", listener.as_ref().unchecked_ref())?;
            if let Some(old) = page.listener.replace(listener) {
                page.form
                    .remove_event_listener_with_callback("submit", old.as_ref().unchecked_ref())?;
            }
            Ok(())
        })
    }

    /// Run one analysis. Resolves to `"success"`, `"error"` or `undefined`
    /// when the input was empty.
    pub fn submit(&self) -> Promise {
        submit(Rc::downgrade(&self.state), Rc::clone(&self.endpoint))
    }

    /// Fire any fades that are due now.
    pub fn tick(&self) -> Result<(), JsValue> {
        pump(&self.state)
    }

    pub fn phase(&self) -> Result<String, JsValue> {
        with_page(&self.state, |page| {
            Ok(format!("{:?}", page.workflow.view().phase()))
        })
    }

    /// Transition trace as JSONL, when `trace` was enabled in the options.
    #[wasm_bindgen(js_name = traceJsonl)]
    pub fn trace_jsonl(&self) -> Result<Option<String>, JsValue> {
        with_page(&self.state, |page| {
            Ok(page.workflow.view().trace().map(|trace| trace.to_jsonl()))
        })
    }

    /// Cancel the fade timer and drop the form listener.
    pub fn destroy(&self) -> Result<(), JsValue> {
        with_page(&self.state, |page| {
            if let Some(handle) = page.timer.take() {
                page.window.clear_timeout_with_handle(handle);
            }
            if let Some(listener) = page.listener.take() {
                page.form
                    .remove_event_listener_with_callback("submit", listener.as_ref().unchecked_ref())?;
            }
            Ok(())
        })
    }
}
