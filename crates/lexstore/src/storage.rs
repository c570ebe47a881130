//! Storage engine implementation
//!
//! File layout:
//! - `store.lex`: header + append-only log of set/delete records
//!
//! The log is read once on open to rebuild the in-memory index. Values are
//! read back from the file on every lookup. Records are always appended at
//! the end of the valid prefix, so a failed write never strands later ones
//! behind unparsable bytes.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use ahash::RandomState;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::kv::KeyValueStore;
use crate::parser::{
    create_header, encode_delete, encode_set, parse_header, parse_record, Record, HEADER_LEN,
    LEX_VERSION,
};

/// Maximum value size (1 MB)
const MAX_VALUE_SIZE: usize = 1024 * 1024;

const DATA_FILE: &str = "store.lex";
const COMPACT_FILE: &str = "store.lex.compact";

/// Location of a live value inside the data file
#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: u64,
    len: usize,
    /// Size of the whole record, counted as garbage once superseded
    record_len: u64,
}

type Index = HashMap<String, Slot, RandomState>;

struct State {
    file: File,
    index: Index,
    size: u64,
    dead_bytes: u64,
    closed: bool,
}

/// LexStore is the file-backed key-value medium
pub struct LexStore {
    /// Path to the store directory
    path: PathBuf,

    /// File handle, index and bookkeeping behind one lock
    state: Mutex<State>,
}

impl LexStore {
    /// Open or create a store at the given directory
    ///
    /// # Arguments
    /// * `path` - Directory path for the store files
    ///
    /// # Returns
    /// * `Result<LexStore>` - Store handle
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let data_path = path.join(DATA_FILE);
        let state = if data_path.exists() {
            Self::open_existing(&data_path)?
        } else {
            Self::create_new(&data_path)?
        };

        info!(
            path = %path.display(),
            keys = state.index.len(),
            bytes = state.size,
            "store opened"
        );

        Ok(LexStore {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    fn open_existing(data_path: &Path) -> Result<State> {
        let mut file = OpenOptions::new().read(true).write(true).open(data_path)?;

        let mut log = Vec::new();
        file.read_to_end(&mut log)?;
        let _version = parse_header(&log)?;

        let (index, valid_len, dead_bytes) = replay(&log)?;
        let file_len = log.len() as u64;

        if valid_len < file_len {
            warn!(
                valid = valid_len,
                total = file_len,
                "truncating torn tail of store log"
            );
            file.set_len(valid_len)?;
        }

        Ok(State {
            file,
            index,
            size: valid_len,
            dead_bytes,
            closed: false,
        })
    }

    fn create_new(data_path: &Path) -> Result<State> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(data_path)?;

        let header = create_header(LEX_VERSION);
        file.write_all(&header)?;

        Ok(State {
            file,
            index: Index::default(),
            size: header.len() as u64,
            dead_bytes: 0,
            closed: false,
        })
    }

    /// Store a value under a key, replacing any previous value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        if value.len() > MAX_VALUE_SIZE {
            return Err(Error::ValueTooLarge(value.len()));
        }

        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }

        let record = encode_set(key, value);
        let offset = append(&mut state, &record)?;

        let value_offset = offset + (record.len() - value.len() - 1) as u64;
        let slot = Slot {
            offset: value_offset,
            len: value.len(),
            record_len: record.len() as u64,
        };
        if let Some(old) = state.index.insert(key.to_string(), slot) {
            state.dead_bytes += old.record_len;
        }

        Ok(())
    }

    /// Read the value stored under a key
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }

        let slot = match state.index.get(key) {
            Some(slot) => *slot,
            None => return Ok(None),
        };

        state.file.seek(SeekFrom::Start(slot.offset))?;
        let mut buf = vec![0u8; slot.len];
        state.file.read_exact(&mut buf)?;

        String::from_utf8(buf)
            .map(Some)
            .map_err(|e| Error::Parse(format!("value for '{}' is not UTF-8: {}", key, e)))
    }

    /// Remove a key; no-op if absent
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }

        if !state.index.contains_key(key) {
            return Ok(());
        }

        let record = encode_delete(key);
        append(&mut state, &record)?;

        if let Some(old) = state.index.remove(key) {
            state.dead_bytes += old.record_len + record.len() as u64;
        }

        Ok(())
    }

    /// All live keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }

        let mut keys: Vec<String> = state.index.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Check whether a key is live
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock().index.contains_key(key)
    }

    /// Get the number of live keys
    pub fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().index.is_empty()
    }

    /// Bytes held by superseded or deleted records
    pub fn dead_bytes(&self) -> u64 {
        self.state.lock().dead_bytes
    }

    /// Rewrite the log keeping only live values
    ///
    /// # Returns
    /// * `Result<u64>` - Number of bytes reclaimed
    pub fn compact(&self) -> Result<u64> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(Error::Closed);
        }

        let compact_path = self.path.join(COMPACT_FILE);
        let mut out = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&compact_path)?;
        out.write_all(&create_header(LEX_VERSION))?;

        let mut keys: Vec<String> = state.index.keys().cloned().collect();
        keys.sort();

        let mut index = Index::default();
        let mut size = HEADER_LEN as u64;
        for key in keys {
            let slot = state.index[&key];
            state.file.seek(SeekFrom::Start(slot.offset))?;
            let mut value = vec![0u8; slot.len];
            state.file.read_exact(&mut value)?;
            let value = String::from_utf8(value)
                .map_err(|e| Error::Parse(format!("value for '{}' is not UTF-8: {}", key, e)))?;

            let record = encode_set(&key, &value);
            out.write_all(&record)?;
            index.insert(
                key,
                Slot {
                    offset: size + (record.len() - slot.len - 1) as u64,
                    len: slot.len,
                    record_len: record.len() as u64,
                },
            );
            size += record.len() as u64;
        }
        out.sync_all()?;
        drop(out);

        let data_path = self.path.join(DATA_FILE);
        std::fs::rename(&compact_path, &data_path)?;

        let reclaimed = state.size.saturating_sub(size);
        state.file = OpenOptions::new().read(true).write(true).open(&data_path)?;
        state.index = index;
        state.size = size;
        state.dead_bytes = 0;

        debug!(reclaimed, "store compacted");
        Ok(reclaimed)
    }

    /// Close the store and fsync all changes
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.closed {
            return Ok(());
        }

        state.file.sync_all()?;
        state.closed = true;

        Ok(())
    }
}

impl Drop for LexStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Write `record` at the end of the valid prefix and advance it
///
/// On failure the file is cut back to the previous end so no partial record
/// is left for the next append to follow.
fn append(state: &mut State, record: &[u8]) -> Result<u64> {
    let offset = state.size;
    let written = state
        .file
        .seek(SeekFrom::Start(offset))
        .and_then(|_| state.file.write_all(record));

    if let Err(e) = written {
        if let Err(rollback) = state.file.set_len(offset) {
            warn!(offset, error = %rollback, "could not roll back failed append");
        }
        return Err(e.into());
    }

    state.size = offset + record.len() as u64;
    Ok(offset)
}

/// Replay the log, returning the index, the length of the valid prefix and
/// the number of garbage bytes.
fn replay(log: &[u8]) -> Result<(Index, u64, u64)> {
    let mut index = Index::default();
    let mut dead_bytes = 0u64;
    let mut pos = HEADER_LEN;

    while pos < log.len() {
        let rest = &log[pos..];
        let (next, record) = match parse_record(rest) {
            Ok(parsed) => parsed,
            Err(_) => break,
        };
        let record_len = rest.len() - next.len();

        match record {
            Record::Set { key, value } => {
                let key = decode_key(key)?;
                let slot = Slot {
                    offset: (pos + record_len - value.len() - 1) as u64,
                    len: value.len(),
                    record_len: record_len as u64,
                };
                if let Some(old) = index.insert(key, slot) {
                    dead_bytes += old.record_len;
                }
            }
            Record::Delete { key } => {
                let key = decode_key(key)?;
                if let Some(old) = index.remove(&key) {
                    dead_bytes += old.record_len;
                }
                dead_bytes += record_len as u64;
            }
        }

        pos += record_len;
    }

    Ok((index, pos as u64, dead_bytes))
}

fn decode_key(key: &[u8]) -> Result<String> {
    String::from_utf8(key.to_vec()).map_err(|e| Error::Parse(format!("key is not UTF-8: {}", e)))
}

impl KeyValueStore for LexStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.get(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.remove(key)
    }

    fn all_keys(&self) -> Result<Vec<String>> {
        self.keys()
    }
}
