use crate::error::Result;

/// Key size used for shred runs.
pub const SHRED_KEY_LEN: usize = 64;

pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    getrandom::getrandom(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("rng: {e}")))?;
    Ok(())
}

/// Fresh random key material of `len` bytes.
pub fn random_key(len: usize) -> Result<Vec<u8>> {
    let mut k = vec![0u8; len];
    fill_random(&mut k)?;
    Ok(k)
}
