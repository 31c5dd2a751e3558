//! Pool of independent lookup-source instances
//!
//! Each query borrows one instance for its duration. Instances are built
//! lazily by a factory the first time no idle instance is available, so the
//! pool grows to the peak number of concurrent queries. A crossbeam channel
//! holds the idle instances; lending is `try_recv`, returning is `try_send`.

use crate::database::LookupSource;
use crate::error::{LookupError, OpenError};
use crate::rangedb::QueryMask;
use crate::record::ResultRecord;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{fence, AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, warn};

type Factory = Box<dyn Fn() -> Result<Box<dyn LookupSource>, OpenError> + Send + Sync>;

/// Source that answers every query with the same error.
///
/// Stands in for an instance the pool factory failed to build.
#[derive(Debug, Clone)]
pub struct ErrorSource {
    error: LookupError,
}

impl ErrorSource {
    /// Source failing with `error`
    pub fn new(error: impl Into<LookupError>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// The error every query returns
    pub fn error(&self) -> &LookupError {
        &self.error
    }
}

impl LookupSource for ErrorSource {
    fn query(&self, _ip: &str, _mask: QueryMask) -> Result<ResultRecord, LookupError> {
        Err(self.error.clone())
    }

    fn lookup(&self, _addr: IpAddr, _mask: QueryMask) -> Result<ResultRecord, LookupError> {
        Err(self.error.clone())
    }
}

/// Lazily grown pool of lookup sources.
///
/// # Examples
///
/// ```no_run
/// use ip2loc::source::MmapSource;
/// use ip2loc::{Database, InstancePool, LookupSource, QueryMask};
/// use std::sync::Arc;
///
/// // One mapping, one Database per concurrent caller
/// let bytes = Arc::new(MmapSource::open("IP2LOCATION-LITE-DB11.BIN")?);
/// let pool = InstancePool::new(move || Database::open(Arc::clone(&bytes)));
/// let record = pool.query("8.8.8.8", QueryMask::ALL)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct InstancePool {
    factory: Factory,
    idle_tx: Sender<Box<dyn LookupSource>>,
    idle_rx: Receiver<Box<dyn LookupSource>>,
    created: AtomicUsize,
    closed: AtomicBool,
}

impl InstancePool {
    /// Pool with no bound on idle instances
    pub fn new<F, S>(factory: F) -> Self
    where
        F: Fn() -> Result<S, OpenError> + Send + Sync + 'static,
        S: LookupSource + 'static,
    {
        let (idle_tx, idle_rx) = unbounded();
        Self::build(factory, idle_tx, idle_rx)
    }

    /// Pool keeping at most `max_idle` instances; extra returns are closed
    pub fn with_max_idle<F, S>(factory: F, max_idle: usize) -> Self
    where
        F: Fn() -> Result<S, OpenError> + Send + Sync + 'static,
        S: LookupSource + 'static,
    {
        let (idle_tx, idle_rx) = bounded(max_idle);
        Self::build(factory, idle_tx, idle_rx)
    }

    fn build<F, S>(
        factory: F,
        idle_tx: Sender<Box<dyn LookupSource>>,
        idle_rx: Receiver<Box<dyn LookupSource>>,
    ) -> Self
    where
        F: Fn() -> Result<S, OpenError> + Send + Sync + 'static,
        S: LookupSource + 'static,
    {
        Self {
            factory: Box::new(move || {
                factory().map(|source| Box::new(source) as Box<dyn LookupSource>)
            }),
            idle_tx,
            idle_rx,
            created: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Instances built so far, including error stand-ins
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Instances currently idle in the pool
    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    fn lend(&self) -> Box<dyn LookupSource> {
        if let Ok(instance) = self.idle_rx.try_recv() {
            return instance;
        }

        let n = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        match (self.factory)() {
            Ok(instance) => {
                debug!(instances = n, "pool created lookup instance");
                instance
            }
            Err(e) => {
                warn!(error = %e, "pool factory failed; pooling error source");
                Box::new(ErrorSource::new(e))
            }
        }
    }

    fn give_back(&self, instance: Box<dyn LookupSource>) {
        if self.closed.load(Ordering::Acquire) {
            instance.close();
            return;
        }
        self.park(instance);
    }

    /// Queue `instance` as idle. A `close` that raced past the check in
    /// `give_back` would miss it, so the flag is read again once it is queued.
    fn park(&self, instance: Box<dyn LookupSource>) {
        if let Err(rejected) = self.idle_tx.try_send(instance) {
            rejected.into_inner().close();
            return;
        }
        fence(Ordering::SeqCst);
        if self.closed.load(Ordering::Acquire) {
            self.drain_idle();
        }
    }

    fn drain_idle(&self) {
        for instance in self.idle_rx.try_iter() {
            instance.close();
        }
    }

    fn with_instance<F>(&self, ask: F) -> Result<ResultRecord, LookupError>
    where
        F: FnOnce(&dyn LookupSource) -> Result<ResultRecord, LookupError>,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(LookupError::NotRunning);
        }
        let instance = self.lend();
        let result = ask(instance.as_ref());
        self.give_back(instance);
        result
    }
}

impl LookupSource for InstancePool {
    fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        self.with_instance(|instance| instance.query(ip, mask))
    }

    fn lookup(&self, addr: IpAddr, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        self.with_instance(|instance| instance.lookup(addr, mask))
    }

    /// Stop lending and close every idle instance. Instances on loan are
    /// closed as they come back.
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        fence(Ordering::SeqCst);
        self.drain_idle();
    }
}

impl fmt::Debug for InstancePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstancePool")
            .field("created", &self.created())
            .field("idle", &self.idle())
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}
