//! Database handles
//!
//! [`Database`] pairs a [`ByteSource`] with the header and schema decoded from
//! it at open time. Both are immutable afterward, so a `Database` over a
//! memory-backed source can be shared between threads and queried
//! concurrently.
//!
//! [`LookupSource`] is the query interface shared by a single database and by
//! every composition built on top of it: [`MultiSource`], [`CachedSource`],
//! [`SerializedAccess`](crate::serialized::SerializedAccess) and
//! [`InstancePool`](crate::pool::InstancePool).
//!
//! # Examples
//!
//! ```no_run
//! use ip2loc::{Database, LookupSource, QueryMask};
//!
//! // Single file, memory-mapped, with a result cache
//! let db = Database::from("IP2LOCATION-LITE-DB11.BIN")
//!     .cache_capacity(10_000)
//!     .open()?;
//! let record = db.query("8.8.8.8", QueryMask::ALL)?;
//! println!("{}", record);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::cache::CachedSource;
use crate::error::{LookupError, OpenError};
use crate::multi::MultiSource;
use crate::rangedb::{lookup, DatabaseMeta, IpKey, QueryMask, Schema};
use crate::record::ResultRecord;
use crate::source::{ByteSource, FileSource, MmapSource};
use std::fmt;
use std::fs;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Anything that answers address queries.
///
/// Implementations need not be `Sync`; wrap a source in
/// [`SerializedAccess`](crate::serialized::SerializedAccess) or build it
/// through an [`InstancePool`](crate::pool::InstancePool) to share it.
pub trait LookupSource: Send {
    /// Decode the fields in `mask` for the textual address `ip`.
    fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError>;

    /// Same as [`query`](Self::query) for an already parsed address.
    fn lookup(&self, addr: IpAddr, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        self.query(&addr.to_string(), mask)
    }

    /// Release resources that outlive a plain drop (worker threads, pooled
    /// instances). Queries after `close` may fail.
    fn close(&self) {}
}

impl<T: LookupSource + ?Sized> LookupSource for Box<T> {
    fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        (**self).query(ip, mask)
    }

    fn lookup(&self, addr: IpAddr, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        (**self).lookup(addr, mask)
    }

    fn close(&self) {
        (**self).close()
    }
}

impl<T: LookupSource + Sync + ?Sized> LookupSource for Arc<T> {
    fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        (**self).query(ip, mask)
    }

    fn lookup(&self, addr: IpAddr, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        (**self).lookup(addr, mask)
    }

    fn close(&self) {
        (**self).close()
    }
}

/// An opened range database.
pub struct Database<S: ByteSource = MmapSource> {
    source: S,
    meta: DatabaseMeta,
    schema: Schema,
}

impl<S: ByteSource> Database<S> {
    /// Decode the header of `source` and resolve its schema.
    ///
    /// # Errors
    ///
    /// [`OpenError::Truncated`] if the header cannot be read,
    /// [`OpenError::UnknownSchema`] or [`OpenError::Malformed`] if it is
    /// inconsistent.
    pub fn open(source: S) -> Result<Self, OpenError> {
        let meta = DatabaseMeta::read(&source)?;
        let schema = Schema::resolve(meta.schema_id, meta.column_count)?;
        debug!(
            schema = meta.schema_id,
            columns = meta.column_count,
            built = %meta.build_date,
            ipv4_rows = meta.ipv4.row_count,
            ipv6_rows = meta.ipv6.row_count,
            ipv4_index = meta.ipv4.has_index(),
            ipv6_index = meta.ipv6.has_index(),
            "opened database"
        );
        Ok(Database {
            source,
            meta,
            schema,
        })
    }

    /// Header metadata
    pub fn meta(&self) -> &DatabaseMeta {
        &self.meta
    }

    /// Resolved field layout
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Underlying byte source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query by textual address.
    pub fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        let key = IpKey::parse(ip)?;
        self.lookup_key(key, mask)
    }

    /// Query by parsed address.
    pub fn lookup(&self, addr: IpAddr, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        self.lookup_key(IpKey::from(addr), mask)
    }

    /// Query by search key.
    pub fn lookup_key(&self, key: IpKey, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        lookup(&self.meta, &self.schema, &self.source, key, mask)
    }

    /// Close the database, releasing its byte source.
    pub fn close(self) {
        drop(self.source);
    }

    /// Close the database and hand back its byte source.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl Database<MmapSource> {
    /// Memory-map `path` and open it.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, OpenError> {
        Database::open(MmapSource::open(path)?)
    }

    /// Create a database opener with fluent builder API
    ///
    /// `path` may name a single database file or a directory of them.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ip2loc::Database;
    ///
    /// // Defaults (memory-mapped, no cache)
    /// let db = Database::from("IP2LOCATION-LITE-DB1.BIN").open()?;
    ///
    /// // Read through a file handle, cache 50k results
    /// let db = Database::from("/var/lib/ip2location")
    ///     .mmap(false)
    ///     .cache_capacity(50_000)
    ///     .open()?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from(path: impl Into<PathBuf>) -> DatabaseOpener {
        DatabaseOpener::new(path)
    }
}

impl<S: ByteSource> LookupSource for Database<S> {
    fn query(&self, ip: &str, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        Database::query(self, ip, mask)
    }

    fn lookup(&self, addr: IpAddr, mask: QueryMask) -> Result<ResultRecord, LookupError> {
        Database::lookup(self, addr, mask)
    }
}

impl<S: ByteSource + fmt::Debug> fmt::Debug for Database<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("source", &self.source)
            .field("meta", &self.meta)
            .finish()
    }
}

/// Options for opening databases from the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Memory-map files (otherwise read through a file handle)
    pub mmap: bool,

    /// Result cache capacity per opened path (0 = disabled)
    pub cache_capacity: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            mmap: true,
            cache_capacity: 0,
        }
    }
}

/// Builder for opening databases with custom configuration
///
/// Created via [`Database::from`].
#[derive(Debug, Clone)]
pub struct DatabaseOpener {
    path: PathBuf,
    options: OpenOptions,
}

impl DatabaseOpener {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: OpenOptions::default(),
        }
    }

    /// Memory-map database files (default) or read them through a
    /// mutex-guarded file handle.
    pub fn mmap(mut self, enabled: bool) -> Self {
        self.options.mmap = enabled;
        self
    }

    /// Cache up to `capacity` successful results, keyed by address text and mask.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.options.cache_capacity = capacity;
        self
    }

    /// Disable the result cache
    pub fn no_cache(mut self) -> Self {
        self.options.cache_capacity = 0;
        self
    }

    /// Current options
    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    /// Open the file or directory with the configured options. The result
    /// can be shared between threads behind an `Arc`.
    pub fn open(self) -> Result<Box<dyn LookupSource + Sync>, OpenError> {
        let source = open_path(&self.path, &self.options)?;
        Ok(match self.options.cache_capacity {
            0 => source,
            capacity => Box::new(CachedSource::new(source, capacity)),
        })
    }
}

/// Open a single file or a directory without caching
fn open_path(
    path: &Path,
    options: &OpenOptions,
) -> Result<Box<dyn LookupSource + Sync>, OpenError> {
    let metadata = fs::metadata(path)
        .map_err(|e| OpenError::Io(format!("Failed to stat {}: {}", path.display(), e)))?;
    if metadata.is_dir() {
        return Ok(Box::new(open_dir(path, options)?));
    }
    open_file(path, options)
}

fn open_file(
    path: &Path,
    options: &OpenOptions,
) -> Result<Box<dyn LookupSource + Sync>, OpenError> {
    debug!(path = %path.display(), mmap = options.mmap, "opening database file");
    if options.mmap {
        Ok(Box::new(Database::open(MmapSource::open(path)?)?))
    } else {
        Ok(Box::new(Database::open(FileSource::open(path)?)?))
    }
}

/// Returns true for `*.bin` names, ignoring case
fn is_database_file(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("bin"))
}

/// Sorted `(path, is_dir)` pairs; entries whose name or type can't be read
/// are skipped with a warning.
fn readable_entries<I>(dir: &Path, entries: I) -> Vec<(PathBuf, bool)>
where
    I: IntoIterator<Item = io::Result<(PathBuf, io::Result<bool>)>>,
{
    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok((path, Ok(is_dir))) => paths.push((path, is_dir)),
            Ok((path, Err(e))) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable entry")
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "skipping unreadable entry"),
        }
    }
    paths.sort();
    paths
}

/// Compose every `*.bin` file under `dir` into a [`MultiSource`].
///
/// Entries are visited in name order. Subdirectories become nested
/// `MultiSource`s. Entries that can't be read are skipped with a warning,
/// but a database file that fails to open fails the whole call.
/// The result cache in `options` is not applied per file.
pub fn open_dir<P: AsRef<Path>>(dir: P, options: &OpenOptions) -> Result<MultiSource, OpenError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir)
        .map_err(|e| OpenError::Io(format!("Failed to read {}: {}", dir.display(), e)))?;

    let paths = readable_entries(
        dir,
        entries.map(|entry| {
            entry.map(|entry| {
                let is_dir = entry.file_type().map(|file_type| file_type.is_dir());
                (entry.path(), is_dir)
            })
        }),
    );

    let mut multi = MultiSource::new();
    for (path, is_dir) in paths {
        if is_dir {
            multi.push(open_dir(&path, options)?);
        } else if is_database_file(&path) {
            multi.push_boxed(open_file(&path, options)?);
        } else {
            debug!(path = %path.display(), "ignoring non-database file");
        }
    }
    debug!(dir = %dir.display(), sources = multi.len(), "opened database directory");
    Ok(multi)
}
