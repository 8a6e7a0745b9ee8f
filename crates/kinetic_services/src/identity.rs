//! Identity provider boundary
//!
//! The animation core only needs to know whether the visitor is signed in
//! and which auth actions to offer. Signed-out visitors get "sign in" and
//! "sign up"; signed-in visitors get none.

use crate::error::IdentityError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// A user-facing auth action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthAction {
    SignIn,
    SignUp,
}

impl AuthAction {
    pub fn label(self) -> &'static str {
        match self {
            AuthAction::SignIn => "Sign in",
            AuthAction::SignUp => "Sign up",
        }
    }
}

/// Source of the authenticated flag and entry point to the auth flows
pub trait IdentityProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn begin_sign_in(&self) -> Result<(), IdentityError>;

    fn begin_sign_up(&self) -> Result<(), IdentityError>;

    /// Dispatch `action` to the matching flow
    fn perform(&self, action: AuthAction) -> Result<(), IdentityError> {
        match action {
            AuthAction::SignIn => self.begin_sign_in(),
            AuthAction::SignUp => self.begin_sign_up(),
        }
    }
}

/// Actions to offer for the provider's current state
pub fn available_actions(provider: &dyn IdentityProvider) -> Vec<AuthAction> {
    if provider.is_authenticated() {
        Vec::new()
    } else {
        vec![AuthAction::SignIn, AuthAction::SignUp]
    }
}

/// In-process provider whose flows complete immediately
#[derive(Debug, Default)]
pub struct StaticIdentity {
    signed_in: AtomicBool,
}

impl StaticIdentity {
    pub fn new(signed_in: bool) -> Self {
        Self {
            signed_in: AtomicBool::new(signed_in),
        }
    }

    pub fn sign_out(&self) {
        self.signed_in.store(false, Ordering::Release);
        tracing::debug!("signed out");
    }

    fn complete(&self, action: AuthAction) -> Result<(), IdentityError> {
        if self.signed_in.swap(true, Ordering::AcqRel) {
            return Err(IdentityError::AlreadySignedIn);
        }
        tracing::debug!(?action, "auth flow completed");
        Ok(())
    }
}

impl IdentityProvider for StaticIdentity {
    fn is_authenticated(&self) -> bool {
        self.signed_in.load(Ordering::Acquire)
    }

    fn begin_sign_in(&self) -> Result<(), IdentityError> {
        self.complete(AuthAction::SignIn)
    }

    fn begin_sign_up(&self) -> Result<(), IdentityError> {
        self.complete(AuthAction::SignUp)
    }
}
