//! Process-wide libxml2 lifecycle
//!
//! libxml2 keeps global parser state that must be initialized before any
//! schema or document is parsed and released only once nothing uses it any
//! more. [`XsdRuntime`] is the token for that period: every handle borrows it,
//! so the borrow checker refuses to tear the runtime down while handles are
//! alive, and only one runtime can be active at a time.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::error::{InitError, LibXml2Error, LibXml2Result};
use crate::libxml2::{
    XML_WITH_SCHEMAS, XML_WITH_THREAD, reclaim_native_memory, xmlCleanupParser, xmlHasFeature,
    xmlInitGlobals, xmlInitParser,
};

/// Set while a runtime is active
static ACTIVE: AtomicBool = AtomicBool::new(false);

const REQUIRED_FEATURES: [(i32, &str); 2] = [(XML_WITH_THREAD, "thread"), (XML_WITH_SCHEMAS, "schema")];

/// Active libxml2 state, optionally with a periodic memory reclamation worker
///
/// Create it once with [`XsdRuntime::init`] or
/// [`XsdRuntime::init_with_reclamation`], share `&XsdRuntime` with every thread
/// that creates handles, and finish with [`XsdRuntime::cleanup`]. Dropping the
/// runtime without calling `cleanup` performs the same teardown.
///
/// ```no_run
/// use xsdvalidate::{DocumentHandle, ErrorMode, SchemaHandle, XsdRuntime};
///
/// let runtime = XsdRuntime::init()?;
/// {
///     let schema = SchemaHandle::parse(&runtime, "shiporder.xsd", ErrorMode::Default)?;
///     let document = DocumentHandle::parse(&runtime, b"<shiporder/>", ErrorMode::Default)?;
///     let outcome = schema.validate(&document, ErrorMode::Verbose)?;
///     println!("valid: {}", outcome.is_valid());
/// }
/// runtime.cleanup()?;
/// # Ok::<(), xsdvalidate::XsdError>(())
/// ```
#[derive(Debug)]
pub struct XsdRuntime {
    reclaimer: Option<Reclaimer>,
    schema_parser: Mutex<()>,
    live_handles: AtomicUsize,
    sweeps: Arc<AtomicU64>,
    torn_down: bool,
}

impl XsdRuntime {
    /// Initialize libxml2
    ///
    /// # Errors
    ///
    /// Returns [`InitError::AlreadyInitialized`] if another runtime is active and
    /// [`InitError::MissingFeature`] if libxml2 lacks thread or schema support.
    pub fn init() -> Result<Self, InitError> {
        Self::start(None)
    }

    /// Initialize libxml2 and run native memory reclamation every `interval`
    ///
    /// Long-lived processes that validate many documents otherwise keep the
    /// peak of their native heap. The worker runs on its own thread and is
    /// stopped and joined by [`XsdRuntime::cleanup`].
    pub fn init_with_reclamation(interval: Duration) -> Result<Self, InitError> {
        if interval.is_zero() {
            return Err(InitError::InvalidInterval);
        }
        Self::start(Some(interval))
    }

    fn start(interval: Option<Duration>) -> Result<Self, InitError> {
        if ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(InitError::AlreadyInitialized);
        }

        unsafe {
            xmlInitParser();
            xmlInitGlobals();
        }

        for (feature, name) in REQUIRED_FEATURES {
            if unsafe { xmlHasFeature(feature) } == 0 {
                release_native_state();
                return Err(InitError::MissingFeature { feature: name });
            }
        }

        let sweeps = Arc::new(AtomicU64::new(0));
        let reclaimer = match interval {
            Some(interval) => match Reclaimer::spawn(interval, Arc::clone(&sweeps)) {
                Ok(reclaimer) => Some(reclaimer),
                Err(err) => {
                    release_native_state();
                    return Err(InitError::ReclamationSpawn(err));
                }
            },
            None => None,
        };

        info!(reclamation = ?interval, "libxml2 runtime initialized");

        Ok(Self {
            reclaimer,
            schema_parser: Mutex::new(()),
            live_handles: AtomicUsize::new(0),
            sweeps,
            torn_down: false,
        })
    }

    /// Whether a runtime is currently active in this process
    pub fn is_active() -> bool {
        ACTIVE.load(Ordering::Acquire)
    }

    pub fn reclamation_interval(&self) -> Option<Duration> {
        self.reclaimer.as_ref().map(|reclaimer| reclaimer.interval)
    }

    /// Number of reclamation sweeps performed so far
    pub fn reclamation_sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Schema and document handles created from this runtime and not yet freed
    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::Acquire)
    }

    /// Stop the reclamation worker and release libxml2 state
    ///
    /// Consumes the runtime, so it cannot be cleaned up twice.
    ///
    /// # Errors
    ///
    /// Returns [`LibXml2Error::OutstandingHandles`] when handles were leaked
    /// (e.g. with `std::mem::forget`); libxml2 state is then left in place
    /// rather than freed underneath them.
    pub fn cleanup(mut self) -> LibXml2Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> LibXml2Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;

        if let Some(reclaimer) = self.reclaimer.take() {
            reclaimer.stop();
        }

        let outstanding = self.live_handles();
        if outstanding > 0 {
            warn!(outstanding, "libxml2 runtime torn down with live handles");
            ACTIVE.store(false, Ordering::Release);
            return Err(LibXml2Error::OutstandingHandles { count: outstanding });
        }

        release_native_state();
        info!(sweeps = self.reclamation_sweeps(), "libxml2 runtime cleaned up");
        Ok(())
    }

    /// Serializes schema compilation
    pub(crate) fn lock_schema_parser(&self) -> MutexGuard<'_, ()> {
        self.schema_parser
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn handle_created(&self) {
        self.live_handles.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn handle_released(&self) {
        self.live_handles.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Drop for XsdRuntime {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            warn!(%err, "libxml2 runtime dropped without a clean teardown");
        }
    }
}

fn release_native_state() {
    unsafe {
        xmlCleanupParser();
    }
    ACTIVE.store(false, Ordering::Release);
}

/// Background worker that periodically reclaims native memory
#[derive(Debug)]
struct Reclaimer {
    interval: Duration,
    stop: Sender<()>,
    worker: JoinHandle<()>,
}

impl Reclaimer {
    fn spawn(interval: Duration, sweeps: Arc<AtomicU64>) -> std::io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("xsd-reclaim".to_string())
            .spawn(move || {
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let released = reclaim_native_memory();
                            let count = sweeps.fetch_add(1, Ordering::Relaxed) + 1;
                            trace!(count, released, "native memory reclamation sweep");
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        debug!(?interval, "reclamation worker started");
        Ok(Self {
            interval,
            stop,
            worker,
        })
    }

    /// Wakes the worker and waits for it to exit
    fn stop(self) {
        // A send error only means the worker already exited.
        let _ = self.stop.send(());
        if self.worker.join().is_err() {
            warn!("reclamation worker panicked");
        } else {
            debug!("reclamation worker stopped");
        }
    }
}
