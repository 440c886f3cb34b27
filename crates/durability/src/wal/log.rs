//! Single-file append-only job log
//!
//! ## File Operations
//!
//! - `JobLog::open()` - Open existing log or create a new one
//! - `JobLog::append()` - Write one framed record, flush, fsync
//! - `JobLog::replay()` - Scan from the beginning, invoking a handler per record
//! - `JobLog::close()` - Flush, fsync and release the file
//!
//! ## Durability
//!
//! Every append is flushed and fsynced before it returns. "The log accepted
//! the record" therefore means "the record is on stable storage", which is
//! what the engine relies on before mutating memory.
//!
//! ## Crash Tolerance
//!
//! A crash during append can leave a partial record at the end of the file.
//! Replay detects it (end of file inside the kind/length/data fields, or a
//! declared length running past the end of the file) and stops cleanly
//! before it. The log never truncates or rewrites the file itself, so a
//! record appended after a partial one could never be framed again; replay
//! that discards a partial tail therefore closes the log to appends.

use super::DurableLog;
use crate::format::{RecordKind, RECORD_HEADER_SIZE};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use stratq_core::{QueueError, QueueResult};
use tracing::{debug, info, warn};

/// Cumulative log operation counters.
///
/// These counters accumulate over the lifetime of the JobLog and are never
/// reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCounters {
    /// Successful record appends
    pub appends: u64,
    /// fsync calls
    pub sync_calls: u64,
    /// Bytes written, frame headers included
    pub bytes_written: u64,
    /// Nanoseconds spent in fsync
    pub sync_nanos: u64,
}

/// Statistics from one replay pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Complete records handed to the handler
    pub records_replayed: u64,
    /// Bytes covered by complete records
    pub bytes_replayed: u64,
    /// Bytes of a partial trailing record that were discarded
    pub truncated_tail_bytes: u64,
}

impl ReplayStats {
    /// Whether replay stopped at a partial trailing record
    pub fn has_truncated_tail(&self) -> bool {
        self.truncated_tail_bytes > 0
    }
}

/// Append-only job log backed by a single file
///
/// Record format: `[kind: u8][length: u32 BE][data: length bytes]`.
///
/// Once an append fails, or a replay discards a partial trailing record, the
/// log refuses further appends with `LogUnavailable`. A partially written
/// record can then only ever be the last record in the file, which replay
/// discards.
///
/// # Example
///
/// ```ignore
/// use stratq_durability::{JobLog, DurableLog, RecordKind};
///
/// let mut log = JobLog::open("data/queue.log")?;
/// log.append(RecordKind::Dispatch, b"job-1")?;
///
/// log.replay(|kind, data| {
///     println!("{} {} bytes", kind, data.len());
///     Ok(())
/// })?;
/// log.close()?;
/// ```
pub struct JobLog {
    /// File path
    path: PathBuf,

    /// File handle, opened in append mode with read capability
    file: File,

    /// Frame assembly buffer, reused across appends
    frame: Vec<u8>,

    /// Current file size (offset of the next record)
    size: u64,

    /// Set once an append fails or replay finds a partial tail
    failed: bool,

    /// Set by close() so Drop does not sync again
    closed: bool,

    counters: LogCounters,
}

impl JobLog {
    /// Open an existing log or create a new one
    ///
    /// Does not create parent directories; the caller owns directory layout.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be created or opened.
    pub fn open<P: AsRef<Path>>(path: P) -> QueueResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        let size = file.metadata()?.len();
        debug!(path = %path.display(), size, "Opened job log");

        Ok(Self {
            path,
            file,
            frame: Vec::with_capacity(256),
            size,
            failed: false,
            closed: false,
            counters: LogCounters::default(),
        })
    }

    /// Append one record, then flush and fsync before returning
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Offset where the record was written
    /// * `Err(Io)` - Write, flush or fsync failed; the record is not durable
    /// * `Err(LogUnavailable)` - An earlier append failed
    pub fn append(&mut self, kind: RecordKind, data: &[u8]) -> QueueResult<u64> {
        if self.failed {
            return Err(QueueError::LogUnavailable);
        }

        let len = u32::try_from(data.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record data of {} bytes exceeds u32 length", data.len()),
            )
        })?;

        let offset = self.size;

        self.frame.clear();
        self.frame.write_u8(kind.as_u8())?;
        self.frame.write_u32::<BigEndian>(len)?;
        self.frame.extend_from_slice(data);

        if let Err(e) = self.write_frame() {
            self.failed = true;
            warn!(
                path = %self.path.display(),
                kind = kind.name(),
                offset,
                error = %e,
                "Job log append failed; refusing further appends"
            );
            return Err(e.into());
        }

        let written = self.frame.len() as u64;
        self.size += written;
        self.counters.appends += 1;
        self.counters.bytes_written += written;

        Ok(offset)
    }

    /// Write the assembled frame, flush, fsync
    fn write_frame(&mut self) -> io::Result<()> {
        self.file.write_all(&self.frame)?;
        self.file.flush()?;

        let start = Instant::now();
        self.file.sync_all()?;
        self.counters.sync_calls += 1;
        self.counters.sync_nanos += start.elapsed().as_nanos() as u64;
        Ok(())
    }

    /// Replay every complete record from the start of the file
    ///
    /// The handler is called once per complete record, in file order. If it
    /// returns an error, replay stops and that error is returned. A partial
    /// trailing record is discarded and reported in `ReplayStats`, and the
    /// log stops accepting appends.
    ///
    /// # Errors
    ///
    /// * `Io` - A read failed for a reason other than end of file
    /// * `MalformedRecord` - A complete record carries an unknown kind tag
    /// * Any error returned by the handler
    pub fn replay<F>(&mut self, mut handler: F) -> QueueResult<ReplayStats>
    where
        F: FnMut(RecordKind, &[u8]) -> QueueResult<()>,
    {
        let file_len = self.file.metadata()?.len();
        let mut reader = BufReader::new(&self.file);
        reader.seek(SeekFrom::Start(0))?;

        let mut stats = ReplayStats::default();
        let mut offset = 0u64;
        let mut data = Vec::new();

        loop {
            // Clean end of log: EOF exactly at a record boundary
            let Some(tag) = read_tag(&mut reader)? else {
                break;
            };

            let len = match reader.read_u32::<BigEndian>() {
                Ok(len) => len,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    stats.truncated_tail_bytes = file_len - offset;
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let end = offset + RECORD_HEADER_SIZE as u64 + u64::from(len);
            if end > file_len {
                stats.truncated_tail_bytes = file_len - offset;
                break;
            }

            data.resize(len as usize, 0);
            match reader.read_exact(&mut data) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    stats.truncated_tail_bytes = file_len - offset;
                    break;
                }
                Err(e) => return Err(e.into()),
            }

            let kind = RecordKind::try_from(tag).map_err(|e| {
                QueueError::malformed(format!("at offset {}: {}", offset, e))
            })?;
            handler(kind, &data)?;

            stats.records_replayed += 1;
            offset = end;
        }

        stats.bytes_replayed = offset;

        if stats.has_truncated_tail() {
            self.failed = true;
            warn!(
                path = %self.path.display(),
                offset,
                discarded = stats.truncated_tail_bytes,
                "Discarded partial trailing record in job log; refusing appends"
            );
        }
        info!(
            path = %self.path.display(),
            records = stats.records_replayed,
            bytes = stats.bytes_replayed,
            "Job log replay complete"
        );

        Ok(stats)
    }

    /// Flush, fsync and close the log
    pub fn close(mut self) -> QueueResult<()> {
        self.closed = true;
        self.file.flush()?;
        self.file.sync_all()?;
        debug!(path = %self.path.display(), size = self.size, "Closed job log");
        Ok(())
    }

    /// Current file size (offset for next append)
    pub fn size(&self) -> u64 {
        self.size
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the log refuses appends
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Snapshot of cumulative counters
    pub fn counters(&self) -> LogCounters {
        self.counters.clone()
    }
}

/// Read the kind tag, or `None` at a clean end of file
fn read_tag<R: Read>(reader: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

impl DurableLog for JobLog {
    fn append(&mut self, kind: RecordKind, data: &[u8]) -> QueueResult<u64> {
        JobLog::append(self, kind, data)
    }

    fn replay<F>(&mut self, handler: F) -> QueueResult<ReplayStats>
    where
        F: FnMut(RecordKind, &[u8]) -> QueueResult<()>,
    {
        JobLog::replay(self, handler)
    }

    fn close(self) -> QueueResult<()> {
        JobLog::close(self)
    }
}

impl Drop for JobLog {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.file.flush();
            let _ = self.file.sync_all();
        }
    }
}
