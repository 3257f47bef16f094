//! Admin flag management.
//!
//! # Usage
//!
//! ```bash
//! # Grant admin rights to an existing account
//! luxe-cli admin grant -e admin@example.com
//!
//! # Revoke them
//! luxe-cli admin revoke -e admin@example.com
//!
//! # List all users with their admin flag
//! luxe-cli admin list
//! ```
//!
//! Accounts are created through `POST /api/auth/signup`; this command only
//! flips `is_admin`.

use luxe_core::Email;
use luxe_storefront::db::{Repositories, RepositoryError};

use super::{CliError, connect};

/// Set or clear the admin flag on the user with `email`.
///
/// # Errors
///
/// Returns `CliError::InvalidEmail` for a malformed address and
/// `CliError::UserNotFound` if no account uses it.
pub async fn set_admin(email: &str, is_admin: bool) -> Result<(), CliError> {
    let parsed = Email::parse(email).map_err(|e| CliError::InvalidEmail(e.to_string()))?;

    let repos = Repositories::postgres(connect().await?);
    let user = repos
        .users
        .set_admin(&parsed, is_admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CliError::UserNotFound(email.to_owned()),
            other => other.into(),
        })?;

    if is_admin {
        tracing::info!("Granted admin to {} ({})", user.email, user.id);
    } else {
        tracing::info!("Revoked admin from {} ({})", user.email, user.id);
    }
    Ok(())
}

/// Print every user with their admin flag.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn list() -> Result<(), CliError> {
    let repos = Repositories::postgres(connect().await?);
    let users = repos.users.list_all().await?;

    tracing::info!("{} user(s)", users.len());
    for user in users {
        tracing::info!(
            "  {} <{}>{}",
            user.username,
            user.email,
            if user.is_admin { " [admin]" } else { "" }
        );
    }
    Ok(())
}
