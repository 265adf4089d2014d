//! Session token persistence.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::{debug, info};

/// Reads a previously saved session token.
///
/// A missing or blank file is not an error; it means the user has to log in.
pub fn load_token(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let token = contents.trim();
            if token.is_empty() {
                debug!("Token file {} is empty", path.display());
                Ok(None)
            } else {
                Ok(Some(token.to_string()))
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Writes the session token, readable only by the current user.
pub fn save_token(path: &Path, token: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(token.as_bytes())?;
    info!("Saved session token to {}", path.display());
    Ok(())
}
