//! Scoped deployment credentials.
//!
//! Credentials are explicit values handed to the post-success runner at
//! construction time. The stage executor has no access path to them, so
//! build and test commands can never observe deploy secrets.

use crate::errors::SecretError;
use base64::Engine as _;

/// A single credential, decoded and ready to inject as an environment
/// variable into a publish command.
#[derive(Clone)]
pub struct CredentialBlob {
    env_name: String,
    value: String,
}

impl CredentialBlob {
    /// Creates a credential from an already-decoded value.
    #[must_use]
    pub fn new(env_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            env_name: env_name.into(),
            value: value.into(),
        }
    }

    /// Loads a base64-encoded credential from the environment.
    ///
    /// `source_var` names the variable holding the encoded blob;
    /// `env_name` is the variable the decoded value will be injected as.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset, not valid base64, or does
    /// not decode to UTF-8.
    pub fn from_env(source_var: &str, env_name: impl Into<String>) -> Result<Self, SecretError> {
        let encoded =
            std::env::var(source_var).map_err(|_| SecretError::Missing(source_var.to_string()))?;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|_| SecretError::Decode(source_var.to_string()))?;
        let value =
            String::from_utf8(decoded).map_err(|_| SecretError::Utf8(source_var.to_string()))?;

        Ok(Self {
            env_name: env_name.into(),
            value,
        })
    }

    /// The environment variable name the credential is injected as.
    #[must_use]
    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// The decoded credential value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for CredentialBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBlob")
            .field("env_name", &self.env_name)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// The credential set available to the post-success pipeline.
#[derive(Debug, Clone, Default)]
pub struct DeployCredentials {
    /// Credential for the package index.
    pub index: Option<CredentialBlob>,
    /// Credential for the secondary artifact channel.
    pub channel: Option<CredentialBlob>,
}

impl DeployCredentials {
    /// Creates an empty credential set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the package-index credential.
    #[must_use]
    pub fn with_index(mut self, blob: CredentialBlob) -> Self {
        self.index = Some(blob);
        self
    }

    /// Sets the secondary-channel credential.
    #[must_use]
    pub fn with_channel(mut self, blob: CredentialBlob) -> Self {
        self.channel = Some(blob);
        self
    }
}
