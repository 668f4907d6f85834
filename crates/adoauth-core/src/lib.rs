// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # adoauth Core
//!
//! Credentials for the Azure DevOps REST API.
//!
//! This crate provides:
//! - Token providers for interactive OAuth, Azure CLI, environment and PAT auth
//! - `Authorization` header construction for bearer tokens and PATs
//! - Configuration loading
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use adoauth_core::{AuthMode, TokenProviderFactory, build_authorization_header};
//!
//! # async fn example() -> adoauth_core::Result<()> {
//! // Obtain a provider once
//! let provider = TokenProviderFactory::default().create(AuthMode::PreSharedSecret, None, false)?;
//!
//! // Ask it for a token before every request
//! let token = provider.get_token().await?;
//! let header = build_authorization_header(&token);
//! println!("Authorization: {header}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`auth`] - Token providers and credential backends
//! - [`config`] - Configuration loading and paths
//! - [`error`] - Error types
//! - [`header`] - `Authorization` header construction

// ============================================================================
// Authentication
// ============================================================================

pub use auth::{AuthMode, PAT_PREFIX, TokenProvider, TokenProviderFactory};

// ============================================================================
// Header Construction
// ============================================================================

pub use header::{AccessTokenLike, auth_headers, build_authorization_header};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::AuthError;

/// Convenience Result type for adoauth operations.
///
/// This is equivalent to `std::result::Result<T, AuthError>`.
pub type Result<T> = std::result::Result<T, AuthError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{AppConfig, AuthConfig, config_dir, config_file_path, load_config};

// ============================================================================
// Modules
// ============================================================================

pub mod auth;
pub mod config;
pub mod error;
pub mod header;
