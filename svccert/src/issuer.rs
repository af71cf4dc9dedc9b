use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, CertifiedIssuer, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose,
};
use time::{Duration, OffsetDateTime};

use crate::{config::IssuerConfig, error::IssueError};

pub const CA_COMMON_NAME: &str = "e2e-server-cert-ca";
pub const TEMP_DIR_PREFIX: &str = "self-signed-certificate";

pub const CA_CERT_FILE: &str = "ca.crt";
pub const SERVER_CERT_FILE: &str = "server.crt";
pub const SERVER_KEY_FILE: &str = "server.key";

const CA_VALIDITY: Duration = Duration::days(3650);
const SERVER_VALIDITY: Duration = Duration::days(365);

const CA_CERT_MODE: u32 = 0o644;
const SERVER_CERT_MODE: u32 = 0o600;
const SERVER_KEY_MODE: u32 = 0o644;

/// Files written by one issuance run.
#[derive(Debug, Clone)]
pub struct IssuedBundle {
    pub dir: PathBuf,
    pub ca_cert: PathBuf,
    pub server_cert: PathBuf,
    pub server_key: PathBuf,
    pub dns_name: String,
}

/// Issue into a fresh directory under the OS temp dir.
pub fn issue_server_certificate(config: &IssuerConfig) -> Result<IssuedBundle, IssueError> {
    issue_server_certificate_in(&std::env::temp_dir(), config)
}

/// Issue a CA and a server certificate for `config.identity` into a fresh
/// directory created under `parent`.
///
/// The directory is kept on failure; whatever was written before the failing
/// step stays on disk.
pub fn issue_server_certificate_in(
    parent: &Path,
    config: &IssuerConfig,
) -> Result<IssuedBundle, IssueError> {
    let dir = tempfile::Builder::new()
        .prefix(TEMP_DIR_PREFIX)
        .tempdir_in(parent)
        .map_err(IssueError::TempDir)?
        .keep();
    let dir = std::path::absolute(&dir).map_err(IssueError::TempDir)?;
    log::debug!("cert dir: {}", dir.display());
    issue_into(dir, config)
}

fn issue_into(dir: PathBuf, config: &IssuerConfig) -> Result<IssuedBundle, IssueError> {
    let now = OffsetDateTime::now_utc();

    let ca_key = KeyPair::generate().map_err(IssueError::CaKey)?;
    let ca = CertifiedIssuer::self_signed(ca_params(now), ca_key).map_err(IssueError::CaCert)?;
    let ca_cert: &Certificate = ca.as_ref();

    let ca_cert_file = dir.join(CA_CERT_FILE);
    write_file(&ca_cert_file, ca_cert.pem().as_bytes(), CA_CERT_MODE).map_err(|source| {
        IssueError::WriteCaCert {
            path: ca_cert_file.clone(),
            source,
        }
    })?;
    log::debug!("wrote {}", ca_cert_file.display());

    let dns_name = config.identity.dns_name();
    let key = KeyPair::generate().map_err(IssueError::ServerKey)?;
    let signed_cert = server_params(&dns_name, now)
        .and_then(|params| params.signed_by(&key, &ca))
        .map_err(IssueError::ServerCert)?;

    let cert_file = dir.join(SERVER_CERT_FILE);
    let key_file = dir.join(SERVER_KEY_FILE);

    write_file(&cert_file, signed_cert.pem().as_bytes(), SERVER_CERT_MODE).map_err(|source| {
        IssueError::WriteServerCert {
            path: cert_file.clone(),
            source,
        }
    })?;
    log::debug!("wrote {}", cert_file.display());

    write_file(&key_file, key.serialize_pem().as_bytes(), SERVER_KEY_MODE).map_err(|source| {
        IssueError::WriteServerKey {
            path: key_file.clone(),
            source,
        }
    })?;
    log::debug!("wrote {}", key_file.display());

    log::info!("issued {} signed by {}", dns_name, CA_COMMON_NAME);
    Ok(IssuedBundle {
        dir,
        ca_cert: ca_cert_file,
        server_cert: cert_file,
        server_key: key_file,
        dns_name,
    })
}

fn ca_params(now: OffsetDateTime) -> CertificateParams {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, CA_COMMON_NAME);
    params.distinguished_name = dn;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyCertSign,
    ];
    params.not_before = now;
    params.not_after = now + CA_VALIDITY;
    params
}

fn server_params(dns_name: &str, now: OffsetDateTime) -> Result<CertificateParams, rcgen::Error> {
    let mut params = CertificateParams::new(vec![dns_name.to_string()])?;
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, dns_name);
    params.distinguished_name = dn;
    params.is_ca = IsCa::NoCa;
    // EC key: no keyEncipherment
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    // notBefore matches the CA
    params.not_before = now;
    params.not_after = now + SERVER_VALIDITY;
    Ok(params)
}

#[cfg(unix)]
fn write_file(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    use std::{fs::OpenOptions, os::unix::fs::OpenOptionsExt};

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?;
    file.write_all(contents)?;
    file.flush()
}

#[cfg(not(unix))]
fn write_file(path: &Path, contents: &[u8], _mode: u32) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(contents)?;
    file.flush()
}
