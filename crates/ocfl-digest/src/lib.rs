//! Streaming digest computation for the OCFL toolkit.
//!
//! This crate is the concrete implementation of the digest collaborator the
//! core consumes: `digest(algorithm, byte stream) -> hex string`. All eight
//! OCFL-registered algorithms are supported; blake2b at non-512 lengths uses
//! the variable-output construction.

use std::io::Read;

use blake2::digest::{Update as VarUpdate, VariableOutput};
use blake2::{Blake2b512, Blake2bVar};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use ocfl_types::{DigestAlgorithm, TypeError};

pub mod error;

pub use error::{DigestError, DigestResult};

/// Read buffer size for streaming digests.
const BUF_SIZE: usize = 64 * 1024;

/// An in-progress digest computation for one algorithm.
///
/// Wraps the per-algorithm hasher state behind a single `update`/`finalize`
/// surface so callers can stream bytes without matching on the algorithm
/// themselves.
pub struct DigestWriter {
    inner: Inner,
}

enum Inner {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
    Blake2b512(Blake2b512),
    Blake2bVar(Blake2bVar, usize),
}

impl DigestWriter {
    /// Start a digest computation for the given algorithm.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        let inner = match algorithm {
            DigestAlgorithm::Md5 => Inner::Md5(Md5::new()),
            DigestAlgorithm::Sha1 => Inner::Sha1(Sha1::new()),
            DigestAlgorithm::Sha256 => Inner::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => Inner::Sha512(Sha512::new()),
            DigestAlgorithm::Blake2b512 => Inner::Blake2b512(Blake2b512::new()),
            DigestAlgorithm::Blake2b160
            | DigestAlgorithm::Blake2b256
            | DigestAlgorithm::Blake2b384 => {
                let len = algorithm.digest_len();
                // digest_len is always a valid blake2b output size.
                let hasher = Blake2bVar::new(len).expect("valid blake2b output length");
                Inner::Blake2bVar(hasher, len)
            }
        };
        Self { inner }
    }

    /// Feed bytes into the computation.
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            Inner::Md5(h) => Digest::update(h, data),
            Inner::Sha1(h) => Digest::update(h, data),
            Inner::Sha256(h) => Digest::update(h, data),
            Inner::Sha512(h) => Digest::update(h, data),
            Inner::Blake2b512(h) => Digest::update(h, data),
            Inner::Blake2bVar(h, _) => VarUpdate::update(h, data),
        }
    }

    /// Finish and return the lowercase hex digest.
    pub fn finalize(self) -> String {
        match self.inner {
            Inner::Md5(h) => hex::encode(h.finalize()),
            Inner::Sha1(h) => hex::encode(h.finalize()),
            Inner::Sha256(h) => hex::encode(h.finalize()),
            Inner::Sha512(h) => hex::encode(h.finalize()),
            Inner::Blake2b512(h) => hex::encode(h.finalize()),
            Inner::Blake2bVar(h, len) => {
                let mut out = vec![0u8; len];
                h.finalize_variable(&mut out)
                    .expect("output buffer sized to digest length");
                hex::encode(out)
            }
        }
    }
}

/// Digest a byte slice, returning the lowercase hex encoding.
pub fn digest_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    let mut writer = DigestWriter::new(algorithm);
    writer.update(data);
    writer.finalize()
}

/// Digest a byte stream, returning the lowercase hex encoding.
///
/// Reads in 64 KiB chunks so arbitrarily large files never need to fit in
/// memory.
pub fn digest_reader<R: Read>(algorithm: DigestAlgorithm, reader: &mut R) -> DigestResult<String> {
    let mut writer = DigestWriter::new(algorithm);
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.update(&buf[..n]);
    }
    Ok(writer.finalize())
}

/// Parse an algorithm name, failing with `UnsupportedAlgorithm`.
pub fn parse_algorithm(name: &str) -> Result<DigestAlgorithm, TypeError> {
    name.parse()
}

/// Check whether `value` is hex of the correct length for the algorithm.
///
/// OCFL digests are compared case-insensitively, so both cases (and mixed
/// case) are accepted.
pub fn is_valid_hex(algorithm: DigestAlgorithm, value: &str) -> bool {
    value.len() == algorithm.hex_len() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Verify that `data` hashes to `expected` (case-insensitive comparison).
pub fn verify_bytes(algorithm: DigestAlgorithm, data: &[u8], expected: &str) -> bool {
    digest_bytes(algorithm, data) == expected.to_ascii_lowercase()
}
