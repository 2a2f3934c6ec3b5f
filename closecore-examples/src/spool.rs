//! A small on-disk spool, acquired through scopes.
//!
//! Three resources with real cleanup obligations, initialized in a chain
//! (each one owns the one before it):
//!
//! 1. [`SpoolDir`] - a directory that is swept when released.
//! 2. [`LockFile`] - a lock inside the directory; releasing removes the
//!    lock and then sweeps the directory.
//! 3. [`Journal`] - a buffered log file under the lock; releasing flushes
//!    the journal and then releases the lock.
//!
//! [`open_journal`] runs that chain inside a `ChainScope`, and
//! [`SpoolService`] collects several such resources into one long-lived
//! owner through a `CollectScope`.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use closecore::{closer, ChainScope, Close, CollectScope, HandleError, WrapperScope};

/// A spool directory, swept (recursively removed) when closed.
#[derive(Debug)]
pub struct SpoolDir {
    path: PathBuf,
}

impl SpoolDir {
    /// Create the directory (and any missing parents).
    pub fn create(path: &Path) -> Result<Self, HandleError> {
        fs::create_dir_all(path)?;
        tracing::debug!(path = %path.display(), "spool directory created");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// The directory's location on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Close for SpoolDir {
    fn close(&mut self) -> Result<(), HandleError> {
        fs::remove_dir_all(&self.path)?;
        Ok(())
    }
}

/// An exclusive lock on a spool directory. Owns the directory: releasing
/// the lock removes the lock file and then sweeps the directory.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    dir: SpoolDir,
}

impl LockFile {
    /// Take the lock inside `dir`, consuming the directory handle.
    ///
    /// Fails if the lock is already held. A failed acquisition releases
    /// the directory it consumed before reporting, as any fallible
    /// consuming constructor in a chain must.
    pub fn acquire(mut dir: SpoolDir) -> Result<Self, HandleError> {
        let path = dir.path().join("spool.lock");
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self { path, dir }),
            Err(err) => {
                if let Err(sweep) = dir.close() {
                    tracing::error!(error = %sweep, "could not sweep directory after failed lock");
                }
                Err(err.into())
            }
        }
    }

    /// The directory this lock protects.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

impl Close for LockFile {
    fn close(&mut self) -> Result<(), HandleError> {
        fs::remove_file(&self.path)?;
        self.dir.close()
    }
}

/// A buffered, append-only log file held under a [`LockFile`]. Owns the
/// lock: releasing the journal flushes it and then releases the lock.
#[derive(Debug)]
pub struct Journal {
    writer: BufWriter<File>,
    lock: LockFile,
}

impl Journal {
    /// Open (or create) the journal file `name` inside the locked
    /// directory, consuming the lock handle.
    pub fn open(lock: LockFile, name: &str) -> Result<Self, HandleError> {
        let path = lock.dir().join(name);
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Ok(Self {
                writer: BufWriter::new(file),
                lock,
            }),
            Err(err) => {
                let mut lock = lock;
                if let Err(release) = lock.close() {
                    tracing::error!(error = %release, "could not release lock after failed open");
                }
                Err(err.into())
            }
        }
    }

    /// Append one line to the journal.
    pub fn append(&mut self, line: &str) -> Result<(), HandleError> {
        writeln!(self.writer, "{line}")?;
        Ok(())
    }
}

impl Close for Journal {
    fn close(&mut self) -> Result<(), HandleError> {
        // release the lock and sweep even when the flush fails
        let flushed = self.writer.flush();
        self.lock.close()?;
        flushed?;
        Ok(())
    }
}

/// Open a journal in a freshly created, locked spool directory.
///
/// The classic chain: directory, then lock over it, then journal under
/// the lock. Whichever step fails, everything acquired before it is
/// released before the error reaches the caller; on success the caller
/// gets the journal, still open, and closing it unwinds the whole chain.
pub fn open_journal(root: &Path, name: &str) -> Result<Journal, HandleError> {
    let mut scope = ChainScope::new();
    let dir = scope.hook(SpoolDir::create(root)?);
    // fallible work between steps runs under the scope's protection
    fs::write(dir.path().join("MANIFEST"), b"spool v1\n")?;
    let scope = scope.rehook(LockFile::acquire)?;
    let scope = scope.rehook(|lock| Journal::open(lock, name))?;
    Ok(scope.release())
}

/// A composite service owning several spool resources at once: an events
/// journal it writes to while running, plus everything else acquired at
/// startup, kept in a [`WrapperScope`] and released in reverse order at
/// shutdown.
#[derive(Debug)]
pub struct SpoolService {
    events: Journal,
    guard: WrapperScope,
}

impl SpoolService {
    /// Start the service under `root`, acquiring a metrics journal, a pid
    /// file and an events journal.
    ///
    /// If any acquisition fails, the `CollectScope` guarding the sequence
    /// releases whatever was already acquired, in reverse order.
    pub fn start(root: &Path) -> Result<Self, HandleError> {
        fs::create_dir_all(root)?;
        let mut scope = CollectScope::new();

        scope.add(open_journal(&root.join("metrics"), "metrics.log")?);

        let pid_path = root.join("spool.pid");
        fs::write(&pid_path, format!("{}\n", process::id()))?;
        scope.add(closer(move || {
            fs::remove_file(&pid_path)?;
            Ok(())
        }));

        let events = open_journal(&root.join("events"), "events.log")?;
        Ok(Self {
            events,
            guard: scope.release(),
        })
    }

    /// Record one line in the events journal.
    pub fn record(&mut self, line: &str) -> Result<(), HandleError> {
        self.events.append(line)
    }

    /// Flush and release everything the service acquired at startup.
    pub fn shutdown(mut self) -> Result<(), HandleError> {
        self.close()
    }
}

impl Close for SpoolService {
    fn close(&mut self) -> Result<(), HandleError> {
        // the guard's handles are attempted even when the journal fails
        let events = self.events.close();
        self.guard.close()?;
        events
    }
}
