#![deny(missing_docs)]

//! # Onramp Models
//!
//! Core types shared by the onramp session service, SDK and CLI.
//!
//! ## Flow
//!
//! ```text
//! address + network ──► validation ──► SessionTokenRequest ──► /api/session
//!                                                                  │
//!        redirect URL ◄── OnrampUrlBuilder ◄── SessionTokenResponse ┘
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`network`] | Known networks (`Network`) and address families (`NetworkFamily`) |
//! | [`validation`] | Address format checks and network inference |
//! | [`session`] | `/api/session` request/response and error bodies |
//! | [`url_builder`] | Provider deep-link construction (session and legacy modes) |
//! | [`error`] | `ModelError` |

pub mod error;
pub mod network;
pub mod session;
pub mod url_builder;
pub mod validation;

// Re-export the main types at crate root for convenience.
pub use error::*;
pub use network::*;
pub use session::*;
pub use url_builder::*;
pub use validation::AddressValidation;
