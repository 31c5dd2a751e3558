//! Composition of several lookup sources

use crate::database::LookupSource;
use crate::error::LookupError;
use crate::rangedb::QueryMask;
use crate::record::ResultRecord;
use std::fmt;
use std::net::IpAddr;

/// An ordered list of sources queried as one.
///
/// Every source is asked. Sources that answer `Unsupported`,
/// `UnsupportedFamily` or `NoMatch` are skipped; any other error stops the
/// query and is returned as is. With at least one success, the last
/// successful record is returned. Otherwise the last skipped error is
/// returned, or [`LookupError::NoSource`] if there was nothing to ask.
///
/// Children must be `Sync` so the composition can be shared across threads.
/// A source that isn't can be put behind
/// [`SerializedAccess`](crate::serialized::SerializedAccess) first.
#[derive(Default)]
pub struct MultiSource {
    sources: Vec<Box<dyn LookupSource + Sync>>,
}

impl MultiSource {
    /// Create an empty composition
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source; later sources win ties
    pub fn push<S: LookupSource + Sync + 'static>(&mut self, source: S) {
        self.sources.push(Box::new(source));
    }

    /// Append an already boxed source
    pub fn push_boxed(&mut self, source: Box<dyn LookupSource + Sync>) {
        self.sources.push(source);
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if there is nothing to query
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn compose<F>(&self, mut ask: F) -> Result<ResultRecord, LookupError>
    where
        F: FnMut(&dyn LookupSource) -> Result<ResultRecord, LookupError>,
    {
        let mut found = None;
        let mut last_soft = None;
        for source in &self.sources {
            match ask(source.as_ref()) {
                Ok(record) => found = Some(record),
                Err(e) if e.is_soft() => last_soft = Some(e),
                Err(e) => return Err(e),
            }
        }
        match (found, last_soft) {
            (Some(record), _) => Ok(record),
            (None, Some(e)) => Err(e),
            (None, None) => Err(LookupError::NoSource),
        }
    }
}

impl FromIterator<Box<dyn LookupSource + Sync>> for MultiSource {
    fn from_iter<I: IntoIterator<Item = Box<dyn LookupSource + Sync>>>(iter: I) -> Self {
        MultiSource {
            sources: iter.into_iter().collect(),
        }
    }
}

impl LookupSource for MultiSource {
    fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        self.compose(|source| source.query(ip, mask))
    }

    fn lookup(&self, addr: IpAddr, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        self.compose(|source| source.lookup(addr, mask))
    }

    fn close(&self) {
        for source in &self.sources {
            source.close();
        }
    }
}

impl fmt::Debug for MultiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiSource")
            .field("sources", &self.sources.len())
            .finish()
    }
}
