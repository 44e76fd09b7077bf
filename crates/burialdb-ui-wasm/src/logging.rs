#![forbid(unsafe_code)]

//! Browser console logging.
//!
//! With the `console-log` feature, `tracing` events are formatted by a
//! `tracing-subscriber` fmt layer and written to the matching `console`
//! method. Without it, events go nowhere.

use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

pub(crate) fn console_error(msg: &str) {
    console_call("error", msg);
}

/// Call `console[method](msg)`, silently doing nothing if it is missing.
fn console_call(method: &str, msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(func) = Reflect::get(&console, &method.into()) else {
        return;
    };
    let Ok(func) = func.dyn_into::<Function>() else {
        return;
    };
    let _ = func.call1(&console, &JsValue::from_str(msg));
}

pub(crate) fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = match info.location() {
                Some(loc) => format!(
                    "burialdb-ui panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                ),
                None => format!("burialdb-ui panic: {info}"),
            };
            console_error(&msg);
        }));
    });
}

#[cfg(feature = "console-log")]
mod subscriber {
    use std::io;

    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;

    /// Buffers one formatted event and flushes it to the console on drop.
    pub(super) struct ConsoleWriter {
        level: Level,
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if self.buf.is_empty() {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&self.buf);
            let method = match self.level {
                Level::ERROR => "error",
                Level::WARN => "warn",
                Level::INFO => "info",
                Level::DEBUG | Level::TRACE => "debug",
            };
            super::console_call(method, line.trim_end());
            self.buf.clear();
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let _ = io::Write::flush(self);
        }
    }

    pub(super) struct ConsoleMakeWriter;

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

/// Install the console subscriber once. Later calls are no-ops, as is the
/// whole function without the `console-log` feature.
#[cfg(feature = "console-log")]
pub(crate) fn init_console_logging(level: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_writer(subscriber::ConsoleMakeWriter)
        .with_max_level(level)
        .with_target(true)
        .without_time()
        .try_init();
}

#[cfg(not(feature = "console-log"))]
pub(crate) fn init_console_logging(_level: tracing::Level) {}
