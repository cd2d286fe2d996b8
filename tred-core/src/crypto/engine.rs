use crate::error::{Result, TredError};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use std::time::Duration;

#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum CipherSuite {
    #[default]
    XChaCha20Poly1305 = 1,
    Aes256Gcm = 2,
}

impl CipherSuite {
    /// Name used on the command line and in reports.
    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::XChaCha20Poly1305 => "chacha",
            CipherSuite::Aes256Gcm => "aes",
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            x if x == CipherSuite::XChaCha20Poly1305 as u8 => Some(CipherSuite::XChaCha20Poly1305),
            x if x == CipherSuite::Aes256Gcm as u8 => Some(CipherSuite::Aes256Gcm),
            _ => None,
        }
    }
}

impl FromStr for CipherSuite {
    type Err = TredError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chacha" | "xchacha" | "xchacha20poly1305" => Ok(CipherSuite::XChaCha20Poly1305),
            "aes" | "aes-gcm" | "aes256gcm" => Ok(CipherSuite::Aes256Gcm),
            other => Err(TredError::InvalidCipherSuite(other.to_string())),
        }
    }
}

impl fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one stream transformation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sealed {
    /// BLAKE3 over the sealed byte stream.
    pub checksum: [u8; 32],
    pub duration: Duration,
    /// Plaintext bytes consumed or produced.
    pub bytes: u64,
}

impl Sealed {
    pub fn checksum_hex(&self) -> String {
        hex::encode(self.checksum)
    }
}

/// Keyed stream transformation bound to one key and cipher suite.
///
/// Each pool worker owns exactly one engine; implementations don't need
/// to be `Sync`.
pub trait CipherEngine: Send + Sized + 'static {
    fn new(key: &[u8], suite: CipherSuite) -> Result<Self>;
    fn suite(&self) -> CipherSuite;
    fn encrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed>;
    fn decrypt_stream(&self, src: &mut dyn Read, dst: &mut dyn Write) -> Result<Sealed>;
}
