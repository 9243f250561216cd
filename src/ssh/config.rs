//! SSH Configuration

use std::fmt;

use zeroize::Zeroizing;

/// SSH connection configuration
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Remote host address
    pub host: String,

    /// SSH port (default: 22)
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Authentication method
    pub auth: AuthMethod,

    /// Connection timeout in seconds
    pub timeout_secs: u64,

    /// Strict host key checking
    /// - true: reject connections to unknown hosts
    /// - false: accept and remember unknown hosts, still reject changed keys
    pub strict_host_key_checking: bool,
}

/// Authentication methods supported
///
/// Secrets are wiped from memory when the value is dropped.
#[derive(Clone)]
pub enum AuthMethod {
    /// Password authentication
    Password { password: Zeroizing<String> },

    /// SSH key authentication
    Key {
        /// Path to private key file
        key_path: String,
        /// Optional passphrase for encrypted keys
        passphrase: Option<Zeroizing<String>>,
    },
}

impl AuthMethod {
    pub fn password(password: impl Into<String>) -> Self {
        Self::Password {
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn key(key_path: impl Into<String>, passphrase: Option<String>) -> Self {
        Self::Key {
            key_path: key_path.into(),
            passphrase: passphrase.map(Zeroizing::new),
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Password { .. } => f.write_str("Password { .. }"),
            AuthMethod::Key { key_path, .. } => {
                f.debug_struct("Key").field("key_path", key_path).finish_non_exhaustive()
            }
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            auth: AuthMethod::password(String::new()),
            timeout_secs: 30,
            strict_host_key_checking: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_secrets() {
        let auth = AuthMethod::password("hunter2");
        assert!(!format!("{:?}", auth).contains("hunter2"));

        let auth = AuthMethod::key("/home/me/.ssh/id_ed25519", Some("phrase".into()));
        let rendered = format!("{:?}", auth);
        assert!(rendered.contains("id_ed25519"));
        assert!(!rendered.contains("phrase"));
    }
}
