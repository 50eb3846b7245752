use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::errors::{BookingError, Result};
use crate::models::UserProfile;

/// Bearer token passed explicitly into every authenticated request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Default)]
pub struct Session {
    credential: RwLock<Option<Credential>>,
    profile: RwLock<Option<UserProfile>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(credential: Credential) -> Self {
        let session = Self::new();
        session.sign_in(credential, None);
        session
    }

    pub fn sign_in(&self, credential: Credential, profile: Option<UserProfile>) {
        *self.credential.write().unwrap_or_else(PoisonError::into_inner) = Some(credential);
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = profile;
    }

    pub fn set_profile(&self, profile: UserProfile) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(profile);
    }

    pub fn sign_out(&self) {
        *self.credential.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn credential(&self) -> Result<Credential> {
        self.credential
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(BookingError::Unauthorized)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The single place an expired credential is handled: any `Unauthorized`
    /// passing through here signs the session out.
    pub fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(BookingError::Unauthorized) = &result {
            if self.is_signed_in() {
                tracing::warn!("credential rejected by backend, signing out");
            }
            self.sign_out();
        }
        result
    }
}
