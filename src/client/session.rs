use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::ClientError;

/// Whether the client is logged in, and as whom.
///
/// A session is created by [FinanceClient::log_in](super::FinanceClient::log_in),
/// replaced with [Session::Anonymous] on log out, and only read everywhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum Session {
    /// Not logged in.
    #[default]
    Anonymous,
    /// Logged in with an access token.
    Authenticated {
        /// The bearer token sent with every request.
        token: String,
        /// The name the user logged in with.
        username: String,
    },
}

impl Session {
    /// The access token, or [ClientError::NotLoggedIn] for an anonymous session.
    pub fn token(&self) -> Result<&str, ClientError> {
        match self {
            Session::Anonymous => Err(ClientError::NotLoggedIn),
            Session::Authenticated { token, .. } => Ok(token),
        }
    }

    /// The name of the logged in user, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated { username, .. } => Some(username),
        }
    }
}

/// Keeps the [Session] in a JSON file between runs of the command line client.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store the session at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.school_finance/session.json`, or `None` if the home directory is unknown.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(".school_finance").join("session.json"))
    }

    /// Where the session is stored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. A missing file means nobody is logged in.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<Session, ClientError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Session::Anonymous),
            Err(source) => return Err(self.file_error(source)),
        };

        serde_json::from_str(&text).map_err(|source| ClientError::CorruptSession {
            path: self.path.clone(),
            source,
        })
    }

    /// Write `session` to the file, creating its directory if needed.
    ///
    /// On unix the file is readable and writable by its owner only, since it
    /// holds the access token.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.file_error(source))?;
        }

        let text = serde_json::to_string_pretty(session).map_err(|source| {
            ClientError::CorruptSession {
                path: self.path.clone(),
                source,
            }
        })?;

        write_private(&self.path, text.as_bytes()).map_err(|source| self.file_error(source))
    }

    /// Forget the stored session and return [Session::Anonymous].
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<Session, ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(self.file_error(source)),
        }

        Ok(Session::Anonymous)
    }

    fn file_error(&self, source: std::io::Error) -> ClientError {
        ClientError::SessionFile {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        options.mode(0o600);
        // The mode above only applies to new files.
        if path.exists() {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
    }

    options.open(path)?.write_all(contents)
}
