//! PKG signing.
//!
//! Only a placeholder exists: [`sign_pkg`] writes a marker file and
//! [`verify_pkg`] never checks cryptographic content. The reports say so
//! explicitly (`signed: false`, `verified: false`). A real verifier plugs in
//! through [`SignatureVerifier`].

use crate::error::PkgResult;
use crate::manifest::load_manifest;
use fkg_types::RecordValidator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub const SIGNATURES_DIR: &str = "signatures";
pub const SIGNATURE_FILE: &str = "manifest.sig";
pub const SIGNATURE_PLACEHOLDER: &str = "SIGNATURE_PLACEHOLDER_V0.1";

/// Result of [`sign_pkg`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub algorithm: String,
    pub signed: bool,
    pub message: String,
}

/// Result of a signature check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub valid: bool,
    /// Whether a cryptographic check actually happened
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub signature_file_exists: bool,
}

/// Write the placeholder signature for a PKG. The manifest must load.
pub fn sign_pkg(
    pkg_dir: &Path,
    validator: &dyn RecordValidator,
    _private_key: Option<&str>,
) -> PkgResult<SignatureInfo> {
    load_manifest(pkg_dir, validator)?;

    let signatures = pkg_dir.join(SIGNATURES_DIR);
    std::fs::create_dir_all(&signatures)?;
    std::fs::write(signatures.join(SIGNATURE_FILE), SIGNATURE_PLACEHOLDER)?;

    Ok(SignatureInfo {
        algorithm: "ed25519".to_string(),
        signed: false,
        message: "Signature not implemented in v0.1".to_string(),
    })
}

/// Check a PKG's signature.
///
/// Reports `valid` whenever the manifest loads; the signature content itself
/// is not examined.
pub fn verify_pkg(
    pkg_dir: &Path,
    validator: &dyn RecordValidator,
    _public_key: Option<&str>,
) -> VerificationReport {
    if let Err(err) = load_manifest(pkg_dir, validator) {
        return VerificationReport {
            valid: false,
            error: Some(format!("Failed to load manifest: {err}")),
            ..VerificationReport::default()
        };
    }

    let signature_file_exists = pkg_dir.join(SIGNATURES_DIR).join(SIGNATURE_FILE).is_file();
    warn!(
        dir = %pkg_dir.display(),
        signature_file_exists,
        "pkg signature accepted without cryptographic verification"
    );

    VerificationReport {
        valid: true,
        verified: false,
        warning: Some("Signature verification not implemented in v0.1".to_string()),
        error: None,
        signature_file_exists,
    }
}

/// Decides whether a PKG's signature is acceptable.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, pkg_dir: &Path, public_key: Option<&str>) -> VerificationReport;
}

/// The placeholder verifier backed by [`verify_pkg`].
#[derive(Clone)]
pub struct StubVerifier {
    validator: Arc<dyn RecordValidator>,
}

impl StubVerifier {
    pub fn new(validator: Arc<dyn RecordValidator>) -> Self {
        Self { validator }
    }
}

impl fmt::Debug for StubVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StubVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier for StubVerifier {
    fn verify(&self, pkg_dir: &Path, public_key: Option<&str>) -> VerificationReport {
        verify_pkg(pkg_dir, self.validator.as_ref(), public_key)
    }
}
