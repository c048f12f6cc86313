//! Credential validation against an external user-profile store.
//!
//! [`CredentialValidator`] is the capability the site actually uses.
//! [`MembershipProvider`] is the wider account-management contract a host may
//! expect; [`ProfileMembership`] leaves all of it unsupported.

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A user profile held by the external store.
pub trait UserProfile {
    fn username(&self) -> &str;

    /// Check `password` against the stored credential.
    fn verify_password(&self, password: &str) -> bool;
}

/// External user-profile store, including the session's active-visitor
/// marker.
pub trait ProfileStore: Send + Sync {
    type Profile: UserProfile;

    fn find_by_username(&self, username: &str) -> Result<Option<Self::Profile>>;

    fn set_current_visitor(&self, profile: &Self::Profile);

    fn clear_current_visitor(&self);
}

pub trait CredentialValidator {
    /// Validate credentials, marking the session's visitor on success and
    /// clearing it on any failure.
    fn validate(&self, username: &str, password: &str) -> bool;

    fn user_name_by_email(&self, email: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipUser {
    pub username: String,
    pub email: String,
}

/// One page of a paged user query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

fn unsupported<T>(operation: &'static str) -> Result<T> {
    Err(Error::Unsupported { operation })
}

/// Account-management operations beyond credential validation. Every method
/// defaults to [`Error::Unsupported`].
pub trait MembershipProvider: CredentialValidator {
    fn application_name(&self) -> Result<String> {
        unsupported("application_name")
    }

    fn enable_password_reset(&self) -> Result<bool> {
        unsupported("enable_password_reset")
    }

    fn max_invalid_password_attempts(&self) -> Result<u32> {
        unsupported("max_invalid_password_attempts")
    }

    fn min_required_password_length(&self) -> Result<u32> {
        unsupported("min_required_password_length")
    }

    fn confirm_account(&self, _token: &str) -> Result<bool> {
        unsupported("confirm_account")
    }

    fn create_account(&self, _username: &str, _password: &str, _require_confirmation: bool) -> Result<String> {
        unsupported("create_account")
    }

    fn create_user_and_account(
        &self,
        _username: &str,
        _password: &str,
        _require_confirmation: bool,
        _values: &[(String, String)],
    ) -> Result<String> {
        unsupported("create_user_and_account")
    }

    fn delete_account(&self, _username: &str) -> Result<bool> {
        unsupported("delete_account")
    }

    fn generate_password_reset_token(&self, _username: &str, _expires_in_minutes: u32) -> Result<String> {
        unsupported("generate_password_reset_token")
    }

    fn reset_password_with_token(&self, _token: &str, _new_password: &str) -> Result<bool> {
        unsupported("reset_password_with_token")
    }

    fn change_password(&self, _username: &str, _old_password: &str, _new_password: &str) -> Result<bool> {
        unsupported("change_password")
    }

    fn create_user(&self, _username: &str, _password: &str, _email: &str) -> Result<MembershipUser> {
        unsupported("create_user")
    }

    fn delete_user(&self, _username: &str, _delete_related_data: bool) -> Result<bool> {
        unsupported("delete_user")
    }

    fn unlock_user(&self, _username: &str) -> Result<bool> {
        unsupported("unlock_user")
    }

    fn is_confirmed(&self, _username: &str) -> Result<bool> {
        unsupported("is_confirmed")
    }

    fn password_failures_since_last_success(&self, _username: &str) -> Result<u32> {
        unsupported("password_failures_since_last_success")
    }

    fn find_users_by_email(&self, _email: &str, _page: usize, _page_size: usize) -> Result<Page<MembershipUser>> {
        unsupported("find_users_by_email")
    }

    fn find_users_by_name(&self, _username: &str, _page: usize, _page_size: usize) -> Result<Page<MembershipUser>> {
        unsupported("find_users_by_name")
    }

    fn all_users(&self, _page: usize, _page_size: usize) -> Result<Page<MembershipUser>> {
        unsupported("all_users")
    }

    fn number_of_users_online(&self) -> Result<usize> {
        unsupported("number_of_users_online")
    }
}

/// Membership backed by a [`ProfileStore`]. The email address doubles as the
/// username.
pub struct ProfileMembership<S> {
    store: S,
}

impl<S: ProfileStore> ProfileMembership<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ProfileStore> CredentialValidator for ProfileMembership<S> {
    fn validate(&self, username: &str, password: &str) -> bool {
        let profile = match self.store.find_by_username(username) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(username, error = %e, "profile lookup failed");
                None
            }
        };

        if let Some(profile) = profile.filter(|p| p.verify_password(password)) {
            debug!(username = profile.username(), "credentials accepted");
            self.store.set_current_visitor(&profile);
            return true;
        }

        self.store.clear_current_visitor();
        false
    }

    fn user_name_by_email(&self, email: &str) -> String {
        email.to_string()
    }
}

impl<S: ProfileStore> MembershipProvider for ProfileMembership<S> {}
