use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::model::Role;

/// Credential check behind the login screen.
pub trait IdentityVerifier: Send {
    fn verify(&self, email: &str, password: &str) -> Option<Role>;
}

/// The two built-in accounts.
#[derive(Debug, Clone)]
pub struct FixedCredentials {
    accounts: Vec<(String, String, Role)>,
}

impl Default for FixedCredentials {
    fn default() -> Self {
        FixedCredentials {
            accounts: vec![
                ("admin@escola.com".into(), "admin".into(), Role::Administrator),
                ("viewer@escola.com".into(), "viewer".into(), Role::Viewer),
            ],
        }
    }
}

impl IdentityVerifier for FixedCredentials {
    fn verify(&self, email: &str, password: &str) -> Option<Role> {
        self.accounts
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .map(|(_, _, role)| *role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub email: String,
    pub role: Role,
}

/// Login state for the running process. Nothing is persisted.
pub struct Session {
    verifier: Box<dyn IdentityVerifier>,
    user: Option<SessionUser>,
}

impl Session {
    pub fn new(verifier: Box<dyn IdentityVerifier>) -> Self {
        Session {
            verifier,
            user: None,
        }
    }

    pub fn login(&mut self, email: &str, password: &str) -> CoreResult<&SessionUser> {
        let role = self
            .verifier
            .verify(email, password)
            .ok_or(CoreError::Authentication)?;
        Ok(self.user.insert(SessionUser {
            email: email.to_string(),
            role,
        }))
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

/// Gate for every write operation.
pub fn require_admin(role: Option<Role>) -> CoreResult<()> {
    match role {
        Some(Role::Administrator) => Ok(()),
        _ => Err(CoreError::forbidden()),
    }
}

/// Gate for every view; any logged-in role may read.
pub fn require_login(role: Option<Role>) -> CoreResult<Role> {
    role.ok_or_else(|| CoreError::Authorization("log in first".into()))
}
