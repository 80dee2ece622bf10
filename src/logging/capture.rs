//! In-memory log capture for tests.

use std::sync::{Arc, Mutex};

use tracing_subscriber::{fmt, prelude::*, registry::Registry, EnvFilter};

struct VecMakeWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> fmt::MakeWriter<'a> for VecMakeWriter {
    type Writer = VecWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        VecWriterGuard(self.0.clone())
    }
}

struct VecWriterGuard(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for VecWriterGuard {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `f` under a thread-local fmt subscriber and returns what it printed.
pub(crate) fn capture_logs(filter: EnvFilter, f: impl FnOnce()) -> String {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let layer = fmt::layer()
        .with_writer(VecMakeWriter(buffer.clone()))
        .with_ansi(false)
        .with_filter(filter);
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, f);

    let out = buffer.lock().unwrap();
    String::from_utf8_lossy(&out).into_owned()
}
