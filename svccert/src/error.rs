use std::path::PathBuf;

use thiserror::Error;

/// Raised while resolving the issuer configuration, before any key material
/// or directory exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("required flag \"{0}\" not set")]
    Missing(&'static str),

    #[error("flag \"{0}\" must not be empty")]
    Empty(&'static str),

    #[error("{name} is not a valid DNS name: {source}")]
    InvalidDnsName {
        name: String,
        #[source]
        source: rustls::pki_types::InvalidDnsNameError,
    },
}

/// One variant per fatal step of certificate issuance.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to create a temp dir for cert generation: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("failed to create CA private key: {0}")]
    CaKey(#[source] rcgen::Error),

    #[error("failed to create CA cert: {0}")]
    CaCert(#[source] rcgen::Error),

    #[error("failed to write CA cert {path}: {source}")]
    WriteCaCert {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create server private key: {0}")]
    ServerKey(#[source] rcgen::Error),

    #[error("failed to create server cert: {0}")]
    ServerCert(#[source] rcgen::Error),

    #[error("failed to write cert file {path}: {source}")]
    WriteServerCert {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write key file {path}: {source}")]
    WriteServerKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Raised when an issued bundle does not validate as a chain.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificate found in {0}")]
    NoCertificate(PathBuf),

    #[error("CA cert rejected as trust root: {0}")]
    TrustRoot(#[source] rustls::Error),

    #[error("invalid DNS name {name}: {source}")]
    DnsName {
        name: String,
        #[source]
        source: rustls::pki_types::InvalidDnsNameError,
    },

    #[error("failed to build verifier: {0}")]
    Verifier(#[source] rustls::client::VerifierBuilderError),

    #[error("server cert does not chain to CA: {0}")]
    Chain(#[source] rustls::Error),
}
