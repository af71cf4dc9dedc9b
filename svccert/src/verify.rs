use std::{fs::File, io::BufReader, path::Path, sync::Arc};

use rustls::{
    client::{danger::ServerCertVerifier, WebPkiServerVerifier},
    pki_types::{CertificateDer, ServerName, UnixTime},
    RootCertStore,
};

use crate::{error::VerifyError, issuer::IssuedBundle};

/// Check that the server cert in `bundle` chains to its CA and is valid for
/// the bundle's DNS name right now.
pub fn verify_bundle(bundle: &IssuedBundle) -> Result<(), VerifyError> {
    let ca = first_cert(&bundle.ca_cert)?;
    let end_entity = first_cert(&bundle.server_cert)?;
    verify_chain(ca, &end_entity, &bundle.dns_name)
}

pub fn verify_chain(
    ca: CertificateDer<'static>,
    end_entity: &CertificateDer<'_>,
    dns_name: &str,
) -> Result<(), VerifyError> {
    let mut roots = RootCertStore::empty();
    roots.add(ca).map_err(VerifyError::TrustRoot)?;

    let server_name =
        ServerName::try_from(dns_name.to_string()).map_err(|source| VerifyError::DnsName {
            name: dns_name.to_string(),
            source,
        })?;

    let verifier = WebPkiServerVerifier::builder_with_provider(
        Arc::new(roots),
        Arc::new(rustls::crypto::ring::default_provider()),
    )
    .build()
    .map_err(VerifyError::Verifier)?;

    verifier
        .verify_server_cert(end_entity, &[], &server_name, &[], UnixTime::now())
        .map_err(VerifyError::Chain)?;
    log::debug!("{} chains to CA", dns_name);
    Ok(())
}

fn first_cert(path: &Path) -> Result<CertificateDer<'static>, VerifyError> {
    let read_err = |source| VerifyError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(read_err)?;
    let mut br = BufReader::new(file);
    let first = rustls_pemfile::certs(&mut br).next();
    match first {
        Some(cert) => cert.map_err(read_err),
        None => Err(VerifyError::NoCertificate(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        config::{IssuerConfig, ServiceIdentity},
        issuer::issue_server_certificate_in,
    };

    fn issue(parent: &Path, namespace: &str, service: &str) -> IssuedBundle {
        let identity = ServiceIdentity::new(namespace, service).unwrap();
        issue_server_certificate_in(parent, &IssuerConfig::new(identity)).unwrap()
    }

    #[test]
    fn issued_bundle_verifies() {
        let parent = tempfile::tempdir().unwrap();
        let bundle = issue(parent.path(), "default", "my-svc");
        verify_bundle(&bundle).unwrap();
    }

    #[test]
    fn wrong_name_rejected() {
        let parent = tempfile::tempdir().unwrap();
        let bundle = issue(parent.path(), "default", "my-svc");
        let ca = first_cert(&bundle.ca_cert).unwrap();
        let server = first_cert(&bundle.server_cert).unwrap();

        let err = verify_chain(ca, &server, "other-svc.default.svc").unwrap_err();
        assert!(matches!(err, VerifyError::Chain(_)));
    }

    #[test]
    fn foreign_ca_rejected() {
        let parent = tempfile::tempdir().unwrap();
        let a = issue(parent.path(), "default", "my-svc");
        let b = issue(parent.path(), "default", "my-svc");

        let mut mixed = a.clone();
        mixed.ca_cert = b.ca_cert.clone();
        let err = verify_bundle(&mixed).unwrap_err();
        assert!(matches!(err, VerifyError::Chain(_)));
    }

    #[test]
    fn missing_or_empty_files() {
        let parent = tempfile::tempdir().unwrap();
        let mut bundle = issue(parent.path(), "default", "my-svc");

        fs::remove_file(&bundle.server_cert).unwrap();
        assert!(matches!(verify_bundle(&bundle), Err(VerifyError::Read { .. })));

        bundle.server_cert = bundle.dir.join("empty.crt");
        fs::write(&bundle.server_cert, "").unwrap();
        assert!(matches!(verify_bundle(&bundle), Err(VerifyError::NoCertificate(_))));
    }
}
