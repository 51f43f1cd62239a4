//! Streaming SHA-256 content hashing.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes read per iteration; bounds memory regardless of file size.
pub const CHUNK_SIZE: usize = 4096;

/// Computes the SHA-256 digest of a file's content as a lowercase hex string.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be opened or a read
/// fails part-way through.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let file = File::open(path)?;
    hash_reader(file)
}

/// Hashes everything `reader` yields, [`CHUNK_SIZE`] bytes at a time.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
