//! Trace readers and the replay driver for benchmark workloads.
//!
//! A trace is a lazy sequence of `(timestamp, obj_id, size)` requests.
//! Two on-disk formats are supported: comma-separated text and the
//! fixed-width binary layout used by oracle traces. [`replay`] drives a
//! cache through a trace the way the benchmarks do: look the object up
//! and insert it on a miss.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use tracing::warn;

use crate::cache::Cache;

/// One request in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub timestamp: u64,
    pub obj_id: u64,
    pub size: u32,
}

/// Reader for comma-separated traces.
///
/// Each row is `timestamp,obj_id,size[,...]`; trailing columns are
/// ignored and malformed rows are skipped with a warning.
pub struct CsvTraceReader<R> {
    reader: R,
    line: String,
    n_read: u64,
    max_records: Option<u64>,
}

impl CsvTraceReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> CsvTraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            n_read: 0,
            max_records: None,
        }
    }

    /// Stop after at most `max_records` records.
    pub fn with_limit(reader: R, max_records: u64) -> Self {
        let mut this = Self::new(reader);
        this.max_records = Some(max_records);
        this
    }

    fn read_record(&mut self) -> io::Result<Option<TraceRecord>> {
        loop {
            if let Some(max) = self.max_records {
                if self.n_read >= max {
                    return Ok(None);
                }
            }
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            let row = self.line.trim_end();
            if row.is_empty() {
                continue;
            }
            match parse_csv_row(row) {
                Some(record) => {
                    self.n_read += 1;
                    return Ok(Some(record));
                }
                None => {
                    warn!(row, "skipping malformed trace row");
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for CsvTraceReader<R> {
    type Item = io::Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

fn parse_csv_row(row: &str) -> Option<TraceRecord> {
    let mut columns = row.split(',').map(str::trim);
    let timestamp = columns.next()?.parse().ok()?;
    let obj_id = columns.next()?.parse().ok()?;
    let size = columns.next()?.parse().ok()?;
    Some(TraceRecord {
        timestamp,
        obj_id,
        size,
    })
}

/// Fixed record width of the binary trace layout.
const BIN_RECORD_LEN: usize = 24;

/// Reader for fixed-width binary traces.
///
/// Records are little-endian `u32 timestamp, u64 obj_id, u32 size,
/// u64 next_access`; the final field is carried by oracle traces and
/// ignored here.
pub struct BinaryTraceReader<R> {
    reader: R,
    n_read: u64,
    max_records: Option<u64>,
}

impl BinaryTraceReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> BinaryTraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            n_read: 0,
            max_records: None,
        }
    }

    /// Stop after at most `max_records` records.
    pub fn with_limit(reader: R, max_records: u64) -> Self {
        let mut this = Self::new(reader);
        this.max_records = Some(max_records);
        this
    }

    fn read_record(&mut self) -> io::Result<Option<TraceRecord>> {
        if let Some(max) = self.max_records {
            if self.n_read >= max {
                return Ok(None);
            }
        }
        let mut buf = [0u8; BIN_RECORD_LEN];
        let mut filled = 0;
        while filled < BIN_RECORD_LEN {
            let n = self.reader.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < BIN_RECORD_LEN {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated trace record",
            ));
        }
        self.n_read += 1;
        Ok(Some(TraceRecord {
            timestamp: u64::from(le_u32(&buf[0..4])),
            obj_id: le_u64(&buf[4..12]),
            size: le_u32(&buf[12..16]),
        }))
    }
}

impl<R: Read> Iterator for BinaryTraceReader<R> {
    type Item = io::Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(bytes);
    u32::from_le_bytes(raw)
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    u64::from_le_bytes(raw)
}

/// Outcome of a [`replay`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub n_req: u64,
    pub n_miss: u64,
}

impl ReplayReport {
    pub fn miss_ratio(&self) -> f64 {
        if self.n_req == 0 {
            0.0
        } else {
            self.n_miss as f64 / self.n_req as f64
        }
    }
}

/// Drive a cache through a trace: `get` each object, `put` it on a
/// miss.
pub fn replay<I>(cache: &mut Cache<u64, u64>, records: I) -> ReplayReport
where
    I: IntoIterator<Item = TraceRecord>,
{
    let mut report = ReplayReport::default();
    for record in records {
        report.n_req += 1;
        if cache.get(&record.obj_id).is_none() {
            report.n_miss += 1;
            cache.put(record.obj_id, record.obj_id);
        }
    }
    report
}
