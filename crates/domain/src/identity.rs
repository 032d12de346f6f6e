use serde::{Deserialize, Serialize};

/// The signed-in caller as established by the authentication layer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActorIdentity {
    pub user_id: String,
    pub email: String,
    pub verified: bool,
}

impl ActorIdentity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>, verified: bool) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            verified,
        }
    }

    pub fn same_email(&self, other: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(other.trim())
    }
}
