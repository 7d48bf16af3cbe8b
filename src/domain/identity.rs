/// Who paid: an internal user id or a raw email, never both. The enum makes
/// the exclusivity invariant unrepresentable instead of checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayerIdentity {
    User(String),
    Email(String),
}

impl PayerIdentity {
    /// Prefer the internal user id when checkout metadata carries one.
    pub fn from_checkout(user_id: Option<&str>, email: &str) -> Self {
        match user_id {
            Some(id) if !id.is_empty() => Self::User(id.to_string()),
            _ => Self::Email(email.to_string()),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Email(_) => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Self::User(_) => None,
            Self::Email(email) => Some(email),
        }
    }
}
