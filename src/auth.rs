//! Login policy.
//!
//! Identity checks go through `Authenticator` so the configured credential
//! table can be replaced by a real identity provider.

use crate::error::AppError;

pub const DEFAULT_DISPLAY_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub username: String,
    pub display_name: String,
}

impl UserIdentity {
    /// Identity used when no login policy is configured.
    pub fn anonymous() -> Self {
        Self {
            username: String::new(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
        }
    }
}

pub trait Authenticator {
    fn authenticate(&self, username: &str, password: &str) -> Option<UserIdentity>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Credential {
    username: String,
    password: String,
    display_name: String,
}

/// Credentials from configuration, e.g.
/// `ECONLAB_CREDENTIALS="admin:admin123:Administrator;student:pw:Student"`.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialTable {
    entries: Vec<Credential>,
}

impl std::fmt::Debug for CredentialTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialTable")
            .field("users", &self.entries.iter().map(|c| &c.username).collect::<Vec<_>>())
            .finish()
    }
}

impl CredentialTable {
    /// Parse `user:password[:Display Name]` entries separated by `;`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let mut entries = Vec::new();
        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.splitn(3, ':');
            let username = parts.next().unwrap_or("").trim();
            let password = parts.next().ok_or_else(|| {
                AppError::new(2, format!("Invalid credential entry for '{username}': expected user:password[:name]."))
            })?;
            if username.is_empty() {
                return Err(AppError::new(2, "Invalid credential entry: empty username."));
            }
            let display_name = parts
                .next()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(username);
            entries.push(Credential {
                username: username.to_string(),
                password: password.to_string(),
                display_name: display_name.to_string(),
            });
        }
        if entries.is_empty() {
            return Err(AppError::new(2, "ECONLAB_CREDENTIALS is set but contains no entries."));
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Authenticator for CredentialTable {
    fn authenticate(&self, username: &str, password: &str) -> Option<UserIdentity> {
        self.entries
            .iter()
            .find(|c| c.username == username && c.password == password)
            .map(|c| UserIdentity {
                username: c.username.clone(),
                display_name: c.display_name.clone(),
            })
    }
}

/// Resolve the session identity: anonymous without a policy, otherwise the
/// supplied login must match.
pub fn login(
    policy: Option<&dyn Authenticator>,
    credentials: Option<(&str, &str)>,
) -> Result<UserIdentity, AppError> {
    let Some(policy) = policy else {
        return Ok(UserIdentity::anonymous());
    };
    let (username, password) = credentials.ok_or_else(|| {
        AppError::new(3, "Login required: pass --user and --password (or ECONLAB_USER/ECONLAB_PASSWORD).")
    })?;
    policy
        .authenticate(username, password)
        .ok_or_else(|| AppError::new(3, "Invalid username or password."))
}
