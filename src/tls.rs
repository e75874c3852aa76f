//! Certificate and trust configuration for HTTPS requests.

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
enum RootCertificate {
    Pem(Vec<u8>),
    Der(Vec<u8>),
}

/// Trust settings applied to the TLS connections of a request.
///
/// The default trusts the operating system's certificate store together with
/// the bundled web PKI roots.
///
/// # Examples
///
/// ```no_run
/// use entreat::{RequestOptions, TlsConfig};
///
/// # fn example() -> Result<(), entreat::Error> {
/// let pem = std::fs::read("internal-ca.pem").unwrap();
/// let tls = TlsConfig::new().add_root_pem(pem);
/// let response = entreat::get(
///     "https://intranet.example/status",
///     RequestOptions::default().with_tls(tls),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TlsConfig {
    root_certificates: Vec<RootCertificate>,
    built_in_roots: bool,
    accept_invalid_certs: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            root_certificates: Vec::new(),
            built_in_roots: true,
            accept_invalid_certs: false,
        }
    }
}

impl TlsConfig {
    /// Creates the default trust configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trusts an additional PEM-encoded root certificate.
    pub fn add_root_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.root_certificates.push(RootCertificate::Pem(pem.into()));
        self
    }

    /// Trusts an additional DER-encoded root certificate.
    pub fn add_root_der(mut self, der: impl Into<Vec<u8>>) -> Self {
        self.root_certificates.push(RootCertificate::Der(der.into()));
        self
    }

    /// Controls whether the built-in roots are trusted: the operating system's
    /// certificate store and the bundled web PKI roots.
    ///
    /// Turn this off to trust only the roots added explicitly.
    pub fn built_in_roots(mut self, enabled: bool) -> Self {
        self.built_in_roots = enabled;
        self
    }

    /// Disables certificate validation entirely.
    ///
    /// Any certificate is accepted, including expired and self-signed ones.
    /// Only use this against servers you control.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Returns `true` if this is the unmodified default configuration.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply(
        &self,
        mut builder: reqwest::blocking::ClientBuilder,
    ) -> Result<reqwest::blocking::ClientBuilder> {
        for root in &self.root_certificates {
            let certificate = match root {
                RootCertificate::Pem(pem) => reqwest::Certificate::from_pem(pem),
                RootCertificate::Der(der) => reqwest::Certificate::from_der(der),
            }
            .map_err(|e| Error::configuration(format!("Invalid root certificate: {}", e)))?;
            builder = builder.add_root_certificate(certificate);
        }
        Ok(builder
            .tls_built_in_root_certs(self.built_in_roots)
            .danger_accept_invalid_certs(self.accept_invalid_certs))
    }
}
