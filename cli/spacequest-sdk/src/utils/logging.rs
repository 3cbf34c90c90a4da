//! Log capture for tests that assert on what the controller reports.

#[cfg(any(test, feature = "tests"))]
pub mod test_helpers {
    use std::fmt::Display;
    use std::sync::{Arc, Mutex};

    /// A writer that keeps everything written to it in memory.
    #[derive(Clone, Debug, Default)]
    pub struct CollectingWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl CollectingWriter {
        pub fn contains(&self, needle: &str) -> bool {
            self.to_string().contains(needle)
        }
    }

    impl Display for CollectingWriter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            let buffer = self.buffer.lock().unwrap();
            write!(f, "{}", String::from_utf8_lossy(&buffer))
        }
    }

    impl<'w> tracing_subscriber::fmt::MakeWriter<'w> for CollectingWriter {
        type Writer = <Mutex<Vec<u8>> as tracing_subscriber::fmt::MakeWriter<'w>>::Writer;

        fn make_writer(&'w self) -> Self::Writer {
            (*self.buffer).make_writer()
        }
    }

    /// A subscriber at `DEBUG` writing compact lines into the returned writer.
    ///
    /// Install it with [`tracing::subscriber::set_default`]; on a current
    /// thread runtime that also covers spawned tasks.
    pub fn test_subscriber() -> (impl tracing::Subscriber, CollectingWriter) {
        let writer = CollectingWriter::default();

        let subscriber = tracing_subscriber::fmt()
            .with_writer(writer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .compact()
            .without_time()
            .with_level(false)
            .with_target(false)
            .with_ansi(false)
            .finish();

        (subscriber, writer)
    }
}
