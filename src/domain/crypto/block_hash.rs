//! Block hash stream.
//!
//! A producer hands blocks to a dedicated consumer thread that feeds them to
//! the hasher, so reading and hashing overlap. A single slot guarded by a
//! mutex carries one block at a time; two condition variables signal "a block
//! is ready to read" and "the slot may be written again".

use crate::domain::asn1::ByteWindow;
use crate::infra::error::{VerifyError, VerifyResult};
use crate::HashAlgorithm;
use sha2::digest::DynDigest;
use std::io::{ErrorKind, Read};
use std::ops::Range;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

struct Slot {
    block: Vec<u8>,
    readable: bool,
    writable: bool,
    finished: bool,
}

struct Shared {
    slot: Mutex<Slot>,
    read_permitted: Condvar,
    write_permitted: Condvar,
}

/// Incremental digest whose hashing runs on a background thread.
///
/// `write` blocks until the previous block has been taken by the consumer, so
/// at most one block is in flight. Dropping an unfinished stream stops the
/// consumer and discards the digest.
pub struct BlockHashStream {
    shared: Arc<Shared>,
    consumer: Option<JoinHandle<Vec<u8>>>,
    algorithm: HashAlgorithm,
    block_size: usize,
}

impl BlockHashStream {
    /// Starts a consumer thread for `algorithm`. Writes are split into blocks
    /// of at most `block_size` bytes.
    pub fn new(algorithm: HashAlgorithm, block_size: usize) -> VerifyResult<Self> {
        if block_size == 0 {
            return Err(VerifyError::InvalidInput(
                "hash block size must be greater than 0".to_string(),
            ));
        }

        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                block: Vec::with_capacity(block_size),
                readable: false,
                writable: true,
                finished: false,
            }),
            read_permitted: Condvar::new(),
            write_permitted: Condvar::new(),
        });

        let hasher = algorithm.hasher();
        let consumer_shared = Arc::clone(&shared);
        let consumer = thread::Builder::new()
            .name(format!("{}-block-hash", algorithm.as_str()))
            .spawn(move || consume(&consumer_shared, hasher))?;

        Ok(Self {
            shared,
            consumer: Some(consumer),
            algorithm,
            block_size,
        })
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Queues `data` for hashing. Empty input is a no-op.
    pub fn write(&mut self, data: &[u8]) -> VerifyResult<()> {
        for block in data.chunks(self.block_size) {
            self.hand_off(block)?;
        }
        Ok(())
    }

    /// Waits for the consumer to drain every block and returns the digest.
    pub fn finish(mut self) -> VerifyResult<Vec<u8>> {
        self.signal_finished();
        let consumer = self.consumer.take().ok_or_else(|| {
            VerifyError::CryptographicError("hash stream already finished".to_string())
        })?;
        consumer.join().map_err(|_| {
            VerifyError::CryptographicError("hash consumer thread panicked".to_string())
        })
    }

    fn hand_off(&self, block: &[u8]) -> VerifyResult<()> {
        let mut slot = self.lock()?;
        while !slot.writable {
            slot = self
                .shared
                .write_permitted
                .wait(slot)
                .map_err(|_| poisoned())?;
        }
        slot.block.clear();
        slot.block.extend_from_slice(block);
        slot.writable = false;
        slot.readable = true;
        drop(slot);
        self.shared.read_permitted.notify_one();
        Ok(())
    }

    fn lock(&self) -> VerifyResult<MutexGuard<'_, Slot>> {
        self.shared.slot.lock().map_err(|_| poisoned())
    }

    fn signal_finished(&self) {
        let mut slot = self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slot.finished = true;
        drop(slot);
        self.shared.read_permitted.notify_all();
    }
}

impl Drop for BlockHashStream {
    fn drop(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            self.signal_finished();
            let _ = consumer.join();
        }
    }
}

fn consume(shared: &Shared, mut hasher: Box<dyn DynDigest + Send>) -> Vec<u8> {
    let mut block = Vec::new();
    loop {
        {
            let mut slot = shared.slot.lock().unwrap_or_else(PoisonError::into_inner);
            while !slot.readable && !slot.finished {
                slot = shared
                    .read_permitted
                    .wait(slot)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if !slot.readable {
                break;
            }
            // Take the filled buffer and leave the spare one for the producer.
            std::mem::swap(&mut block, &mut slot.block);
            slot.readable = false;
            slot.writable = true;
        }
        shared.write_permitted.notify_one();
        hasher.update(&block);
    }
    hasher.finalize().into_vec()
}

fn poisoned() -> VerifyError {
    VerifyError::CryptographicError("hash stream lock poisoned".to_string())
}

/// Digests the bytes of a window block by block.
pub fn digest_window(
    algorithm: HashAlgorithm,
    window: &ByteWindow,
    block_size: usize,
) -> VerifyResult<Vec<u8>> {
    let mut stream = BlockHashStream::new(algorithm, block_size)?;
    stream.write(window.as_slice())?;
    stream.finish()
}

/// Digests the concatenation of `ranges` of `bytes`, in order.
pub fn digest_ranges(
    algorithm: HashAlgorithm,
    bytes: &[u8],
    ranges: &[Range<usize>],
    block_size: usize,
) -> VerifyResult<Vec<u8>> {
    let mut stream = BlockHashStream::new(algorithm, block_size)?;
    for range in ranges {
        let part = bytes.get(range.clone()).ok_or_else(|| {
            VerifyError::InvalidInput(format!(
                "digest range {}..{} exceeds {} bytes",
                range.start,
                range.end,
                bytes.len()
            ))
        })?;
        stream.write(part)?;
    }
    stream.finish()
}

/// Digests everything `reader` yields.
pub fn digest_reader<R: Read>(
    algorithm: HashAlgorithm,
    mut reader: R,
    block_size: usize,
) -> VerifyResult<Vec<u8>> {
    let mut stream = BlockHashStream::new(algorithm, block_size)?;
    let mut buffer = vec![0u8; block_size];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        stream.write(&buffer[..read])?;
    }
    stream.finish()
}
