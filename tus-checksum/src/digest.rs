use crate::Algorithm;
use digest::Digest as _;
use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;
use std::io::{self, copy, Read, Write};

/// Adapts any [`digest::Digest`] into an [`io::Write`] sink so it can be driven with
/// [`io::copy`], the same streaming-over-`Read` idiom used throughout this workspace's checksum
/// code.
struct HashWriter<D>(D);

impl<D: digest::Digest> Write for HashWriter<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Streams `reader` to completion and returns the raw digest bytes under `algorithm`.
///
/// This is the whole-file digest used to memoize `Upload::checksum` (`ChecksumMode::WholeFile`)
/// and is also reused, over a bounded in-memory cursor, for `ChecksumMode::PerChunk`.
pub fn digest_reader(mut reader: impl Read, algorithm: Algorithm) -> io::Result<Vec<u8>> {
    Ok(match algorithm {
        Algorithm::Sha256 => {
            let mut w = HashWriter(Sha256::new());
            copy(&mut reader, &mut w)?;
            w.0.finalize().to_vec()
        }
        Algorithm::Sha1 => {
            let mut w = HashWriter(Sha1::new());
            copy(&mut reader, &mut w)?;
            w.0.finalize().to_vec()
        }
        Algorithm::Md5 => {
            let mut w = HashWriter(Md5::new());
            copy(&mut reader, &mut w)?;
            w.0.finalize().to_vec()
        }
    })
}

/// Digests an in-memory chunk, used by `ChecksumMode::PerChunk`.
pub fn digest_bytes(data: &[u8], algorithm: Algorithm) -> Vec<u8> {
    digest_reader(data, algorithm).expect("reading from a byte slice never fails")
}
