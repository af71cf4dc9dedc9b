use std::{fs, path::{Path, PathBuf}};

use clap::Parser;
use rustls::pki_types::DnsName;
use serde::Deserialize;

use crate::error::ConfigError;

/// Create a self-signed TLS certificate.
///
/// Generates a throwaway CA and a server certificate for
/// `<service-name>.<namespace>.svc`, writes them to a fresh temp dir and
/// prints that dir.
#[derive(Parser, Debug)]
#[command(name = "self-signed-cert", version, about, long_about = None)]
pub struct Cli {
    /// Namespace in which the service resides into.
    #[arg(long, required_unless_present = "config")]
    pub namespace: Option<String>,

    /// Service for which to generate the certificate.
    #[arg(long = "service-name", required_unless_present = "config")]
    pub service_name: Option<String>,

    /// YAML file providing `namespace` and `service-name`; flags win over it.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Re-read the written files and check the server cert chains to the CA.
    #[arg(long)]
    pub verify: bool,

    /// Log each issuance step.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<IssuerConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        let namespace = self
            .namespace
            .or(file.namespace)
            .ok_or(ConfigError::Missing("namespace"))?;
        let service = self
            .service_name
            .or(file.service_name)
            .ok_or(ConfigError::Missing("service-name"))?;
        Ok(IssuerConfig {
            identity: ServiceIdentity::new(namespace, service)?,
            verify: self.verify,
        })
    }
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct FileConfig {
    pub namespace: Option<String>,
    #[serde(rename = "service-name")]
    pub service_name: Option<String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let c = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&c).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The service a certificate is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    namespace: String,
    service: String,
}

impl ServiceIdentity {
    pub fn new(namespace: impl Into<String>, service: impl Into<String>) -> Result<Self, ConfigError> {
        let namespace = namespace.into();
        let service = service.into();
        if namespace.trim().is_empty() {
            return Err(ConfigError::Empty("namespace"));
        }
        if service.trim().is_empty() {
            return Err(ConfigError::Empty("service-name"));
        }
        let identity = Self { namespace, service };
        let name = identity.dns_name();
        let valid = DnsName::try_from(name.as_str()).map(|_| ());
        if let Err(source) = valid {
            return Err(ConfigError::InvalidDnsName { name, source });
        }
        Ok(identity)
    }

    /// In-cluster DNS name, used as both CN and the only SAN.
    pub fn dns_name(&self) -> String {
        format!("{}.{}.svc", self.service, self.namespace)
    }
}

#[derive(Debug, Clone)]
pub struct IssuerConfig {
    pub identity: ServiceIdentity,
    pub verify: bool,
}

impl IssuerConfig {
    pub fn new(identity: ServiceIdentity) -> Self {
        Self { identity, verify: false }
    }
}
