//! Single-worker access to a lookup source
//!
//! [`SerializedAccess`] moves a source onto a dedicated thread and feeds it
//! queries through a bounded FIFO channel. The source itself only has to be
//! `Send`; it is never touched by two threads at once. Each request carries
//! its own reply channel, so concurrent callers always receive the answer to
//! their own query.

use crate::database::LookupSource;
use crate::error::LookupError;
use crate::rangedb::QueryMask;
use crate::record::ResultRecord;
use crossbeam_channel::{bounded, Sender};
use std::fmt;
use std::io;
use std::net::IpAddr;
use std::sync::{Mutex, RwLock};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Pending requests the queue holds before submitters block
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

enum Address {
    Text(String),
    Parsed(IpAddr),
}

struct Request {
    address: Address,
    mask: QueryMask,
    reply: Sender<Result<ResultRecord, LookupError>>,
}

/// A lookup source served by one worker thread.
///
/// After [`close`](LookupSource::close) every query fails with
/// [`LookupError::NotRunning`]. Requests already queued when `close` is
/// called are still answered. Dropping the handle closes it.
pub struct SerializedAccess {
    requests: RwLock<Option<Sender<Request>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerializedAccess {
    /// Start a worker for `source` with the default queue capacity
    pub fn new<S: LookupSource + 'static>(source: S) -> io::Result<Self> {
        Self::with_capacity(source, DEFAULT_QUEUE_CAPACITY)
    }

    /// Start a worker for `source` with room for `capacity` pending requests
    pub fn with_capacity<S: LookupSource + 'static>(source: S, capacity: usize) -> io::Result<Self> {
        let (tx, rx) = bounded::<Request>(capacity);
        let worker = thread::Builder::new()
            .name("ip2loc-serialized".to_string())
            .spawn(move || {
                debug!("serialized lookup worker started");
                for request in rx.iter() {
                    let result = match &request.address {
                        Address::Text(ip) => source.query(ip, request.mask),
                        Address::Parsed(addr) => source.lookup(*addr, request.mask),
                    };
                    // Caller may have given up waiting
                    let _ = request.reply.send(result);
                }
                source.close();
                debug!("serialized lookup worker stopped");
            })?;

        Ok(Self {
            requests: RwLock::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Returns true until the handle is closed
    pub fn is_running(&self) -> bool {
        self.requests
            .read()
            .map(|requests| requests.is_some())
            .unwrap_or(false)
    }

    fn submit(&self, address: Address, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        let (reply, response) = bounded(1);
        {
            let requests = self.requests.read().map_err(|_| LookupError::NotRunning)?;
            let sender = requests.as_ref().ok_or(LookupError::NotRunning)?;
            sender
                .send(Request {
                    address,
                    mask,
                    reply,
                })
                .map_err(|_| LookupError::NotRunning)?;
        }
        response.recv().map_err(|_| LookupError::NotRunning)?
    }
}

impl LookupSource for SerializedAccess {
    fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        self.submit(Address::Text(ip.to_string()), mask)
    }

    fn lookup(&self, addr: IpAddr, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        self.submit(Address::Parsed(addr), mask)
    }

    fn close(&self) {
        // Dropping the sender lets the worker drain the queue and exit
        match self.requests.write() {
            Ok(mut requests) => drop(requests.take()),
            Err(poisoned) => drop(poisoned.into_inner().take()),
        }

        let handle = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("serialized lookup worker panicked");
            }
        }
    }
}

impl Drop for SerializedAccess {
    fn drop(&mut self) {
        LookupSource::close(self);
    }
}

impl fmt::Debug for SerializedAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedAccess")
            .field("running", &self.is_running())
            .finish()
    }
}
