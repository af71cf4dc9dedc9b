//! Generate a throwaway CA and a server certificate for an in-cluster
//! service (`<service>.<namespace>.svc`) and write them as PEM files into a
//! fresh temp dir.

pub mod config;
pub mod error;
pub mod issuer;
pub mod verify;

pub use config::{Cli, FileConfig, IssuerConfig, ServiceIdentity};
pub use error::{ConfigError, IssueError, VerifyError};
pub use issuer::{issue_server_certificate, issue_server_certificate_in, IssuedBundle};
pub use verify::verify_bundle;
