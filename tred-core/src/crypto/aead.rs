use aes_gcm::Aes256Gcm;
use chacha20poly1305::{
    XChaCha20Poly1305,
    aead::{Aead, KeyInit, Payload},
};
use std::io::{Read, Write};
use std::time::Instant;

use crate::crypto::engine::{CipherEngine, CipherSuite, Sealed};
use crate::crypto::keygen::fill_random;
use crate::error::{Result, TredError};
use crate::util::hash_forward::{HashingForward, HashingReader, read_full};

pub const TAG_LEN: usize = 16;
/// Plaintext bytes per sealed chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;
pub const MAX_KEY_LEN: usize = 4096;

pub const MAGIC: &[u8; 4] = b"TRED";
pub const VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const PREFIX_LEN: usize = 19;
pub const HEADER_LEN: usize = MAGIC.len() + 2 + SALT_LEN + PREFIX_LEN;

const MASTER_CONTEXT: &str = "tred-core 2024-10 sealed file master key";

/// Fixed-size preamble of every sealed file. Also the associated data
/// of every chunk, so suite/salt/prefix can't be swapped.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Header {
    suite: CipherSuite,
    salt: [u8; SALT_LEN],
    prefix: [u8; PREFIX_LEN],
}

impl Header {
    fn random(suite: CipherSuite) -> Result<Self> {
        let mut salt = [0u8; SALT_LEN];
        let mut prefix = [0u8; PREFIX_LEN];
        fill_random(&mut salt)?;
        fill_random(&mut prefix)?;
        Ok(Self {
            suite,
            salt,
            prefix,
        })
    }

    fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(MAGIC);
        out[4] = VERSION;
        out[5] = self.suite as u8;
        out[6..6 + SALT_LEN].copy_from_slice(&self.salt);
        out[6 + SALT_LEN..].copy_from_slice(&self.prefix);
        out
    }

    fn parse(b: &[u8; HEADER_LEN]) -> Result<Self> {
        if &b[..4] != MAGIC {
            return Err(TredError::Malformed("bad magic".into()));
        }
        if b[4] != VERSION {
            return Err(TredError::Malformed(format!("unsupported version {}", b[4])));
        }
        let suite = CipherSuite::from_id(b[5])
            .ok_or_else(|| TredError::Malformed(format!("unknown cipher suite id {}", b[5])))?;
        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&b[6..6 + SALT_LEN]);
        let mut prefix = [0u8; PREFIX_LEN];
        prefix.copy_from_slice(&b[6 + SALT_LEN..]);
        Ok(Self {
            suite,
            salt,
            prefix,
        })
    }

    /// nonce = prefix || be32(counter) || last_flag, prefix cut to the suite's nonce size
    fn nonce(&self, counter: u32, last: bool) -> Vec<u8> {
        let keep = match self.suite {
            CipherSuite::XChaCha20Poly1305 => PREFIX_LEN, // 24-byte nonce
            CipherSuite::Aes256Gcm => 7,                  // 12-byte nonce
        };
        let mut n = Vec::with_capacity(keep + 5);
        n.extend_from_slice(&self.prefix[..keep]);
        n.extend_from_slice(&counter.to_be_bytes());
        n.push(last as u8);
        n
    }
}

enum FileCipher {
    XChaCha(XChaCha20Poly1305),
    Aes(Aes256Gcm),
}

impl FileCipher {
    fn new(suite: CipherSuite, key: &[u8; 32]) -> Self {
        match suite {
            CipherSuite::XChaCha20Poly1305 => {
                FileCipher::XChaCha(XChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key)))
            }
            CipherSuite::Aes256Gcm => {
                FileCipher::Aes(Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key)))
            }
        }
    }

    fn seal(&self, nonce: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload { msg, aad };
        let out = match self {
            FileCipher::XChaCha(c) => c.encrypt(chacha20poly1305::XNonce::from_slice(nonce), payload),
            FileCipher::Aes(c) => c.encrypt(aes_gcm::Nonce::from_slice(nonce), payload),
        };
        out.map_err(|_| TredError::Malformed("chunk could not be sealed".into()))
    }

    fn open(&self, nonce: &[u8], aad: &[u8], msg: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload { msg, aad };
        let out = match self {
            FileCipher::XChaCha(c) => c.decrypt(chacha20poly1305::XNonce::from_slice(nonce), payload),
            FileCipher::Aes(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), payload),
        };
        out.map_err(|_| TredError::Authentication)
    }
}

/// Chunked AEAD engine: 64 KiB chunks, per-file key and nonce prefix.
pub struct TredEngine {
    suite: CipherSuite,
    master: [u8; 32],
}

impl TredEngine {
    fn file_cipher(&self, salt: &[u8; SALT_LEN]) -> FileCipher {
        let file_key = blake3::keyed_hash(&self.master, salt);
        FileCipher::new(self.suite, file_key.as_bytes())
    }
}

impl CipherEngine for TredEngine {
    fn new(key: &[u8], suite: CipherSuite) -> Result<Self> {
        if key.is_empty() {
            return Err(TredError::InvalidKey("key is empty".into()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(TredError::InvalidKey(format!(
                "key is {} bytes, at most {MAX_KEY_LEN} allowed",
                key.len()
            )));
        }
        Ok(Self {
            suite,
            master: blake3::derive_key(MASTER_CONTEXT, key),
        })
    }

    fn suite(&self) -> CipherSuite {
        self.suite
    }

    fn encrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed> {
        let start = Instant::now();
        let header = Header::random(self.suite)?;
        let aad = header.to_bytes();
        let cipher = self.file_cipher(&header.salt);

        let mut hasher = blake3::Hasher::new();
        let mut out = HashingForward::new(dst, &mut hasher);
        out.write_all(&aad)?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut counter = 0u32;
        let mut total = 0u64;
        loop {
            let n = read_full(src, &mut buf)?;
            // the final chunk is always short, possibly empty
            let last = n < CHUNK_SIZE;
            let ct = cipher.seal(&header.nonce(counter, last), &aad, &buf[..n])?;
            out.write_all(&ct)?;
            total += n as u64;
            if last {
                break;
            }
            counter = counter
                .checked_add(1)
                .ok_or_else(|| TredError::Malformed("input exceeds chunk counter".into()))?;
        }
        out.flush()?;
        drop(out);

        Ok(Sealed {
            checksum: *hasher.finalize().as_bytes(),
            duration: start.elapsed(),
            bytes: total,
        })
    }

    fn decrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed> {
        let start = Instant::now();
        let mut hasher = blake3::Hasher::new();
        let mut input = HashingReader::new(src, &mut hasher);

        let mut aad = [0u8; HEADER_LEN];
        if read_full(&mut input, &mut aad)? < HEADER_LEN {
            return Err(TredError::Malformed("truncated header".into()));
        }
        let header = Header::parse(&aad)?;
        if header.suite != self.suite {
            return Err(TredError::Malformed(format!(
                "sealed with '{}', engine uses '{}'",
                header.suite, self.suite
            )));
        }
        let cipher = self.file_cipher(&header.salt);

        let mut buf = vec![0u8; CHUNK_SIZE + TAG_LEN];
        let mut counter = 0u32;
        let mut total = 0u64;
        loop {
            let n = read_full(&mut input, &mut buf)?;
            if n < TAG_LEN {
                return Err(TredError::Malformed("truncated stream".into()));
            }
            let last = n < buf.len();
            let pt = cipher.open(&header.nonce(counter, last), &aad, &buf[..n])?;
            dst.write_all(&pt)?;
            total += pt.len() as u64;
            if last {
                break;
            }
            counter = counter
                .checked_add(1)
                .ok_or_else(|| TredError::Malformed("too many chunks".into()))?;
        }
        dst.flush()?;
        drop(input);

        Ok(Sealed {
            checksum: *hasher.finalize().as_bytes(),
            duration: start.elapsed(),
            bytes: total,
        })
    }
}
