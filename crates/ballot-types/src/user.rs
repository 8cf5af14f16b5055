use serde::{Deserialize, Serialize};

use crate::temporal::Timestamp;

/// Non-secret profile fields of a user.
///
/// This is also the voter snapshot stored with every vote (`user_info` on
/// disk); it is copied at cast time and never refreshed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub city: String,
}

/// A registered account as stored in the users table, keyed by email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub name: String,
    /// One-way password hash. Only ever passed to a verifier.
    #[serde(rename = "password")]
    pub password_hash: String,
    pub age: String,
    pub gender: String,
    pub city: String,
    pub registered_at: Timestamp,
}

impl UserRecord {
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            age: self.age.clone(),
            gender: self.gender.clone(),
            city: self.city.clone(),
        }
    }
}

/// An authenticated caller: email plus profile, never the password hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    #[serde(flatten)]
    pub profile: Profile,
}

impl Principal {
    pub fn new(email: impl Into<String>, profile: Profile) -> Self {
        Self {
            email: email.into(),
            profile,
        }
    }
}
