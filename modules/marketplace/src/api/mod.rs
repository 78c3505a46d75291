//! Typed endpoint surfaces, one per resource.
//!
//! Each resource is a trait so consumers can run against mocks, plus an
//! HTTP implementation bound to the client for the right host. Commissions
//! and member account calls go to the member host; estimates and partner
//! account calls go to the partner host.
//!
//! Implementations translate paths and bodies only; retries, caching, and
//! session state belong to the layers above.

pub mod commissions;
pub mod estimates;
pub mod members;
pub mod partners;

pub use commissions::{CommissionsApi, HttpCommissionsApi};
pub use estimates::{EstimatesApi, HttpEstimatesApi};
pub use members::{HttpMembersApi, MembersApi};
pub use partners::{HttpPartnersApi, PartnersApi};
