#![forbid(unsafe_code)]

//! `tracing` subscriber setup for each host.
//!
//! Native hosts get the plain `fmt` subscriber on stderr, honouring
//! `RUST_LOG` before the configured filter. In the browser, formatted lines
//! go to the devtools console through `web-sys`, one console call per event,
//! picking `console.error`/`warn`/`log`/`debug` by level. Timestamps are
//! left out there because `SystemTime` is unavailable on `wasm32`.

use tracing_subscriber::EnvFilter;

fn filter_for(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Returns `false` if one was already set.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_tracing(directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Install the global subscriber. Returns `false` if one was already set.
#[cfg(target_arch = "wasm32")]
pub fn init_tracing(directive: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(directive))
        .with_writer(console::ConsoleMakeWriter)
        .without_time()
        .try_init()
        .is_ok()
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io;

    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    pub struct ConsoleMakeWriter;

    /// Buffers one formatted event and hands it to the console on drop.
    pub struct ConsoleWriter {
        level: Level,
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let text = String::from_utf8_lossy(&self.buf);
            let line = text.trim_end();
            if line.is_empty() {
                return;
            }
            let value = JsValue::from_str(line);
            match self.level {
                Level::ERROR => web_sys::console::error_1(&value),
                Level::WARN => web_sys::console::warn_1(&value),
                Level::INFO => web_sys::console::log_1(&value),
                _ => web_sys::console::debug_1(&value),
            }
        }
    }

    impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: Level::INFO,
                buf: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: *meta.level(),
                buf: Vec::new(),
            }
        }
    }
}
