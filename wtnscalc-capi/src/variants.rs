//! Exported entry points, one per passport circuit.
//!
//! Each variant sits behind a feature flag so a deployment can build an
//! adapter library carrying exactly the circuits it runs. The entry points
//! do not inspect the circuit bytes; pairing a buffer with the wrong entry
//! point is caught by graph validation, not by the name.

#[cfg(feature = "register-sha256-rsa-65537")]
crate::witnesscalc_entry!(register_sha256WithRSAEncryption_65537);

#[cfg(feature = "register-sha1-rsa-65537")]
crate::witnesscalc_entry!(register_sha1WithRSAEncryption_65537);

#[cfg(feature = "dsc-sha256-rsa-4096")]
crate::witnesscalc_entry!(dsc_sha256_rsa_4096);

#[cfg(feature = "dsc-sha1-rsa-4096")]
crate::witnesscalc_entry!(dsc_sha1_rsa_4096);

#[cfg(feature = "disclose")]
crate::witnesscalc_entry!(disclose);
