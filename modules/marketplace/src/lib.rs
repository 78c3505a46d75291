//! # Marketplace - typed client for the cleaning marketplace
//!
//! Everything specific to the marketplace domain lives here, layered over
//! `clientkit`:
//!
//! - **Models**: wire records for commissions, estimates, and the two
//!   account kinds
//! - **API surfaces**: one trait per resource plus its HTTP implementation,
//!   split across the member and partner hosts
//! - **Session**: process-wide login state with optimistic restore
//! - **Queries**: cache-aware reads and invalidating mutations
//! - **Forms**: field-keyed drafts that validate before building request
//!   bodies

pub mod api;
pub mod form;
pub mod model;
pub mod queries;
pub mod session;

pub use queries::{CommissionQueries, EstimateQueries};
pub use session::{Session, SessionPhase};
