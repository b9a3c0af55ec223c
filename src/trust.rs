//! Certificate trust policy for self-hosted Exchange servers
//!
//! On-premises Exchange installs routinely present self-signed, expired
//! or incomplete certificate chains, and are often reached by IP or an
//! internal name. The policy here tolerates exactly those faults and
//! rejects everything else.
//!
//! The policy is injected per client through [`client_config`]; nothing
//! is installed process-wide.

use crate::error::{Error, Result};
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use tracing::{debug, warn};

/// TLS policy failures reported for one handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyErrors(u8);

impl PolicyErrors {
    pub const NONE: Self = Self(0);
    /// The server presented no certificate.
    pub const NOT_AVAILABLE: Self = Self(1);
    /// The certificate does not match the requested host name.
    pub const NAME_MISMATCH: Self = Self(1 << 1);
    /// Building or validating the chain failed.
    pub const CHAIN_ERRORS: Self = Self(1 << 2);

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PolicyErrors {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One status entry of a validated chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStatus {
    NoError,
    UntrustedRoot,
    NotTimeValid,
    PartialChain,
    Revoked,
    NotSignatureValid,
    InvalidUsage,
    Other(String),
}

/// What the policy needs to know about the server's own certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerCertificate {
    /// Subject equals issuer, i.e. the certificate signs itself.
    pub self_signed: bool,
}

impl PeerCertificate {
    /// Inspect a DER certificate.
    ///
    /// A certificate is self-signed when it validates against a trust
    /// store holding nothing but itself. Name and validity-period
    /// failures still mean the chain closed on itself.
    #[must_use]
    pub fn inspect(
        end_entity: &CertificateDer<'_>,
        server_name: &ServerName<'_>,
        now: UnixTime,
        provider: &Arc<CryptoProvider>,
    ) -> Self {
        Self {
            self_signed: closes_on(end_entity, end_entity, &[], server_name, now, provider),
        }
    }
}

/// Whether the chain from `end_entity` reaches `anchor` when `anchor`
/// is the only trusted certificate. Name and validity-period failures
/// are raised after the chain is built, so they still count.
fn closes_on(
    anchor: &CertificateDer<'_>,
    end_entity: &CertificateDer<'_>,
    intermediates: &[CertificateDer<'_>],
    server_name: &ServerName<'_>,
    now: UnixTime,
    provider: &Arc<CryptoProvider>,
) -> bool {
    let mut store = RootCertStore::empty();
    if store.add(anchor.clone().into_owned()).is_err() {
        return false;
    }
    let Ok(verifier) =
        WebPkiServerVerifier::builder_with_provider(Arc::new(store), provider.clone()).build()
    else {
        return false;
    };

    match verifier.verify_server_cert(end_entity, intermediates, server_name, &[], now) {
        Ok(_) => true,
        Err(rustls::Error::InvalidCertificate(err)) => matches!(
            err,
            CertificateError::NotValidForName
                | CertificateError::NotValidForNameContext { .. }
                | CertificateError::Expired
                | CertificateError::ExpiredContext { .. }
                | CertificateError::NotValidYet
                | CertificateError::NotValidYetContext { .. }
        ),
        Err(_) => false,
    }
}

/// Subject and issuer names are byte-identical.
fn self_issued(der: &CertificateDer<'_>) -> bool {
    x509_parser::parse_x509_certificate(der.as_ref())
        .is_ok_and(|(_, cert)| cert.subject().as_raw() == cert.issuer().as_raw())
}

/// Whether the server sent a root of its own that the chain ends in.
///
/// Such a chain is complete but anchored outside the trust store, as
/// opposed to a partial chain whose root was never presented.
fn presents_root(
    end_entity: &CertificateDer<'_>,
    intermediates: &[CertificateDer<'_>],
    server_name: &ServerName<'_>,
    now: UnixTime,
    provider: &Arc<CryptoProvider>,
) -> bool {
    intermediates.iter().any(|candidate| {
        self_issued(candidate)
            && closes_on(candidate, end_entity, intermediates, server_name, now, provider)
    })
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    Accept,
    Reject,
}

impl TrustDecision {
    #[must_use]
    pub const fn is_accept(self) -> bool {
        matches!(self, Self::Accept)
    }
}

impl fmt::Display for TrustDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
        })
    }
}

/// Decide whether a handshake with the given faults may proceed.
///
/// Chain errors are judged on their own, even when a name mismatch is
/// also present. A name mismatch alone is accepted.
#[must_use]
pub fn evaluate(
    certificate: PeerCertificate,
    chain: &[ChainStatus],
    errors: PolicyErrors,
) -> TrustDecision {
    if errors.is_empty() {
        return TrustDecision::Accept;
    }

    if errors.contains(PolicyErrors::CHAIN_ERRORS) {
        for status in chain {
            match status {
                ChainStatus::UntrustedRoot if certificate.self_signed => {
                    warn!("Self-signed certificate, continuing regardless");
                }
                ChainStatus::NotTimeValid => {
                    warn!("Certificate is outside its validity period, continuing regardless");
                }
                ChainStatus::PartialChain => {
                    warn!("Certificate chain is incomplete, continuing regardless");
                }
                ChainStatus::NoError => {}
                fatal => {
                    warn!("Rejecting certificate: {:?}", fatal);
                    return TrustDecision::Reject;
                }
            }
        }
        return TrustDecision::Accept;
    }

    if errors.contains(PolicyErrors::NAME_MISMATCH) {
        warn!("Certificate name does not match host, continuing regardless");
        return TrustDecision::Accept;
    }

    TrustDecision::Reject
}

/// Translate a verification failure into policy errors and a chain
/// status. An unknown issuer is an untrusted root when the chain ends in
/// a self-signed certificate, either the leaf or one the server sent.
fn classify(
    err: &CertificateError,
    certificate: PeerCertificate,
    root_presented: bool,
) -> (PolicyErrors, ChainStatus) {
    let status = match err {
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. } => {
            return (PolicyErrors::NAME_MISMATCH, ChainStatus::NoError);
        }
        CertificateError::UnknownIssuer if certificate.self_signed || root_presented => {
            ChainStatus::UntrustedRoot
        }
        CertificateError::UnknownIssuer => ChainStatus::PartialChain,
        CertificateError::Expired
        | CertificateError::ExpiredContext { .. }
        | CertificateError::NotValidYet
        | CertificateError::NotValidYetContext { .. } => ChainStatus::NotTimeValid,
        CertificateError::Revoked => ChainStatus::Revoked,
        CertificateError::BadSignature => ChainStatus::NotSignatureValid,
        CertificateError::InvalidPurpose | CertificateError::InvalidPurposeContext { .. } => {
            ChainStatus::InvalidUsage
        }
        other => ChainStatus::Other(format!("{other:?}")),
    };
    (PolicyErrors::CHAIN_ERRORS, status)
}

/// `rustls` verifier applying [`evaluate`] on top of the standard
/// chain and name checks.
#[derive(Debug)]
pub struct TrustPolicyVerifier {
    inner: Arc<WebPkiServerVerifier>,
    provider: Arc<CryptoProvider>,
}

impl TrustPolicyVerifier {
    /// Build a verifier backed by the Mozilla root set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] if the provider cannot build a verifier.
    pub fn new(provider: Arc<CryptoProvider>) -> Result<Self> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .map_err(|e| Error::Tls(format!("Failed to build verifier: {e}")))?;
        Ok(Self { inner, provider })
    }
}

impl ServerCertVerifier for TrustPolicyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let err = match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        ) {
            Ok(verified) => return Ok(verified),
            Err(rustls::Error::InvalidCertificate(err)) => err,
            Err(other) => return Err(other),
        };

        let certificate = PeerCertificate::inspect(end_entity, server_name, now, &self.provider);
        let root_presented = !certificate.self_signed
            && matches!(err, CertificateError::UnknownIssuer)
            && presents_root(end_entity, intermediates, server_name, now, &self.provider);
        let (errors, status) = classify(&err, certificate, root_presented);
        debug!(
            "Certificate for {:?} failed WebPKI checks: {:?}",
            server_name, err
        );

        match evaluate(certificate, &[status], errors) {
            TrustDecision::Accept => Ok(ServerCertVerified::assertion()),
            TrustDecision::Reject => Err(rustls::Error::InvalidCertificate(err)),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// Build a client TLS configuration with the trust policy injected.
///
/// Uses the `ring` provider explicitly so callers never need to install
/// a process-wide default.
///
/// # Errors
///
/// Returns [`Error::Tls`] if the configuration cannot be built.
pub fn client_config() -> Result<Arc<ClientConfig>> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = TrustPolicyVerifier::new(provider.clone())?;
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    Ok(Arc::new(config))
}
