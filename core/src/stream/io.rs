//! Sink wrappers that make close ordering explicit: flush before close,
//! nested resources closed in a declared order, and close-at-most-once.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex, OnceLock};

use flate2::write::GzEncoder;
use tracing::debug;

use crate::constants::DEFAULT_BUFFER_SIZE;

/// Optional capability of a sink: releasing it explicitly and observing the
/// outcome, instead of relying on `Drop`, which swallows errors.
pub trait Close {
    fn close(&mut self) -> io::Result<()>;
}

impl<C: Close + ?Sized> Close for Box<C> {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<C: Close + ?Sized> Close for &mut C {
    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Syncs data and metadata to disk. The descriptor itself is released on drop.
impl Close for File {
    fn close(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// Writes the gzip trailer. Further writes are an error.
impl<W: Write> Close for GzEncoder<W> {
    fn close(&mut self) -> io::Result<()> {
        self.try_finish()
    }
}

/// Turns a closure into a [`Close`].
pub struct CloserFn<F>(F);

impl<F> CloserFn<F>
where
    F: FnMut() -> io::Result<()>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Close for CloserFn<F>
where
    F: FnMut() -> io::Result<()>,
{
    fn close(&mut self) -> io::Result<()> {
        (self.0)()
    }
}

type CloseFn<W> = fn(&mut W) -> io::Result<()>;

/// A buffered sink whose close flushes, then closes the sink.
///
/// Whether the sink gets closed is decided by the constructor: [`closing`]
/// requires `W: Close`, [`new`] leaves the sink open after the flush.
///
/// [`closing`]: BufferedWriteCloser::closing
/// [`new`]: BufferedWriteCloser::new
pub struct BufferedWriteCloser<W: Write> {
    inner: BufWriter<W>,
    close_sink: Option<CloseFn<W>>,
}

impl<W: Write> BufferedWriteCloser<W> {
    pub fn new(sink: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, sink)
    }

    /// `capacity == 0` falls back to the default buffer size.
    pub fn with_capacity(capacity: usize, sink: W) -> Self {
        let capacity = if capacity == 0 { DEFAULT_BUFFER_SIZE } else { capacity };
        Self {
            inner: BufWriter::with_capacity(capacity, sink),
            close_sink: None,
        }
    }

    pub fn get_ref(&self) -> &W {
        self.inner.get_ref()
    }

    /// Bytes written but not yet handed to the sink.
    pub fn buffered(&self) -> usize {
        self.inner.buffer().len()
    }

    /// Whether `close` also closes the sink.
    pub fn closes_sink(&self) -> bool {
        self.close_sink.is_some()
    }

    /// Flush and give the sink back without closing it.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write + Close> BufferedWriteCloser<W> {
    pub fn closing(sink: W) -> Self {
        Self::closing_with_capacity(DEFAULT_BUFFER_SIZE, sink)
    }

    pub fn closing_with_capacity(capacity: usize, sink: W) -> Self {
        let mut this = Self::with_capacity(capacity, sink);
        this.close_sink = Some(<W as Close>::close as CloseFn<W>);
        this
    }
}

impl<W: Write> Write for BufferedWriteCloser<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Close for BufferedWriteCloser<W> {
    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()?;
        match self.close_sink {
            Some(close) => close(self.inner.get_mut()),
            None => Ok(()),
        }
    }
}

/// First failing step of a [`ChainedCloser`].
#[derive(Debug, thiserror::Error)]
#[error("close step {position} failed: {source}")]
pub struct CloseChainError {
    /// Zero-based index of the step in declaration order.
    pub position: usize,
    #[source]
    pub source: io::Error,
}

impl From<CloseChainError> for io::Error {
    fn from(e: CloseChainError) -> Self {
        io::Error::new(e.source.kind(), e)
    }
}

enum CloseStep<W> {
    Owned(Box<dyn Close + Send>),
    Writer(Box<dyn FnMut(&mut W) -> io::Result<()> + Send>),
}

/// A writer plus the resources to release, in order, when it is closed.
///
/// Transferring ownership of a composed writer (a compressor over a file,
/// say) then only requires the new owner to call `close`. Steps either own an
/// independent resource ([`then`]) or reach into the writer itself
/// ([`then_writer`]), which is how nested layers are finished inner-first.
///
/// The first failing step halts the chain; later steps stay unclosed. Closing
/// again resumes at the failed step and never repeats a step that succeeded.
///
/// [`then`]: ChainedCloser::then
/// [`then_writer`]: ChainedCloser::then_writer
pub struct ChainedCloser<W> {
    writer: W,
    steps: Vec<CloseStep<W>>,
    closed: usize,
}

impl<W> ChainedCloser<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            steps: Vec::new(),
            closed: 0,
        }
    }

    /// Append an independent resource.
    pub fn then<C>(mut self, closer: C) -> Self
    where
        C: Close + Send + 'static,
    {
        self.steps.push(CloseStep::Owned(Box::new(closer)));
        self
    }

    /// Append a step that releases part of the writer itself.
    pub fn then_writer<F>(mut self, step: F) -> Self
    where
        F: FnMut(&mut W) -> io::Result<()> + Send + 'static,
    {
        self.steps.push(CloseStep::Writer(Box::new(step)));
        self
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Steps that have not completed yet.
    pub fn pending(&self) -> usize {
        self.steps.len() - self.closed
    }

    /// Run the remaining steps in order.
    pub fn close_chain(&mut self) -> Result<(), CloseChainError> {
        while self.closed < self.steps.len() {
            let position = self.closed;
            let outcome = match &mut self.steps[position] {
                CloseStep::Owned(closer) => closer.close(),
                CloseStep::Writer(step) => step(&mut self.writer),
            };
            if let Err(source) = outcome {
                debug!(position, error = %source, "close chain halted");
                return Err(CloseChainError { position, source });
            }
            self.closed += 1;
        }
        Ok(())
    }

    /// Give back the writer; steps not yet run are dropped unrun.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Write for ChainedCloser<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl<W> Close for ChainedCloser<W> {
    fn close(&mut self) -> io::Result<()> {
        self.close_chain().map_err(io::Error::from)
    }
}

/// Closes the wrapped resource at most once, whatever the number of callers
/// or threads. Every caller receives the outcome of that single close.
pub struct SafeCloser<C> {
    inner: Mutex<C>,
    outcome: OnceLock<Result<(), Arc<io::Error>>>,
}

impl<C: Close> SafeCloser<C> {
    pub fn new(closer: C) -> Self {
        Self {
            inner: Mutex::new(closer),
            outcome: OnceLock::new(),
        }
    }

    pub fn close(&self) -> Result<(), Arc<io::Error>> {
        self.outcome
            .get_or_init(|| {
                let mut inner = match self.inner.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                inner.close().map_err(Arc::new)
            })
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        self.outcome.get().is_some()
    }

    pub fn into_inner(self) -> C {
        match self.inner.into_inner() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<C: Close> Close for SafeCloser<C> {
    fn close(&mut self) -> io::Result<()> {
        SafeCloser::close(self).map_err(|e| io::Error::new(e.kind(), e))
    }
}

/// In-memory sink whose contents stay reachable after the writer has been
/// moved into a wrapper or another thread.
#[derive(Debug, Clone, Default)]
pub struct SharedBufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedBufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<u8>>> {
        self.buf.clone()
    }

    /// Snapshot of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        match self.buf.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Write for SharedBufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .buf
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "shared buffer lock poisoned"))?;
        guard.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
