//! Deciding which hosts need certificates and driving certbot for them.

pub mod issuance;
pub mod policy;
pub mod renewal;
pub mod status;

pub use issuance::{
    build_issuance_request, interpret_issuance, IssuanceOutcome, IssuanceRequest, Issuer,
};
pub use policy::{decide, needs_provisioning, Decision, ProvisioningPolicy};
pub use renewal::{renew_certificates, RenewalOutcome, RenewalStage};
pub use status::{list_certificates, parse_certificates, CertificateInfo};
