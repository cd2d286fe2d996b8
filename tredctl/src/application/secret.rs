use std::fs;
use std::io;
use std::path::Path;

use tred_core::error::Result;
use zeroize::Zeroizing;

pub type Secret = Zeroizing<Vec<u8>>;

fn prompt(label: &str) -> Result<Secret> {
    let s = rpassword::prompt_password(label)?;
    Ok(Zeroizing::new(s.into_bytes()))
}

/// Ask for a key without echo; with `confirm`, ask twice and compare.
pub fn ask(label: &str, confirm: bool) -> Result<Secret> {
    let key = prompt(label)?;
    if !confirm {
        return Ok(key);
    }
    let again = prompt("Confirm Key: ")?;
    confirmed(key, again)
}

pub fn confirmed(key: Secret, again: Secret) -> Result<Secret> {
    if *key != *again {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "provided keys don't match").into());
    }
    Ok(key)
}

/// Raw key bytes from a file, as written by `tredctl key`.
pub fn read_key_file(path: &Path) -> Result<Secret> {
    Ok(Zeroizing::new(fs::read(path)?))
}
