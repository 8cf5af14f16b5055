use ballot_types::{Principal, Timestamp, UserRecord};
use tracing::{info, warn};

use crate::error::{BallotError, Result};
use crate::service::Ballot;

/// Registered accounts and credential checks.
#[derive(Clone, Copy, Debug)]
pub struct UserDirectory<'a> {
    ballot: &'a Ballot,
}

impl<'a> UserDirectory<'a> {
    pub(crate) fn new(ballot: &'a Ballot) -> Self {
        Self { ballot }
    }

    /// Register a new account.
    ///
    /// Every field is required. Whitespace-only values count as empty,
    /// except for the password, which is taken as given.
    pub fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        age: &str,
        gender: &str,
        city: &str,
    ) -> Result<UserRecord> {
        let fields = [
            ("email", email),
            ("name", name),
            ("age", age),
            ("gender", gender),
            ("city", city),
        ];
        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(BallotError::Validation(format!("{field} is required")));
            }
        }
        if password.is_empty() {
            return Err(BallotError::Validation("password is required".into()));
        }

        if self.get_user(email)?.is_some() {
            return Err(BallotError::DuplicateUser(email.to_string()));
        }

        // Hash outside the lock; it is the slow part.
        let password_hash = self.ballot.hasher().hash(password)?;
        let record = UserRecord {
            name: name.to_string(),
            password_hash,
            age: age.to_string(),
            gender: gender.to_string(),
            city: city.to_string(),
            registered_at: Timestamp::now(),
        };

        self.ballot.write(|draft| {
            if draft.users().contains_key(email) {
                return Err(BallotError::DuplicateUser(email.to_string()));
            }
            draft.users_mut().insert(email.to_string(), record.clone());
            Ok(())
        })?;

        info!(email, "user registered");
        Ok(record)
    }

    /// Check an email and password.
    ///
    /// Unknown emails and wrong passwords fail with the same
    /// [`BallotError::Authentication`] after the same amount of work.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Principal> {
        let user = self.get_user(email)?;
        let hasher = self.ballot.hasher();

        match user {
            Some(user) if hasher.verify(password, &user.password_hash) => {
                info!(email, "user authenticated");
                Ok(Principal::new(email, user.profile()))
            }
            Some(_) => {
                warn!(email, "authentication failed");
                Err(BallotError::Authentication)
            }
            None => {
                let _ = hasher.verify(password, self.ballot.dummy_hash());
                warn!(email, "authentication failed");
                Err(BallotError::Authentication)
            }
        }
    }

    pub fn get_user(&self, email: &str) -> Result<Option<UserRecord>> {
        self.ballot.read(|tables| tables.users.get(email).cloned())
    }

    pub fn user_count(&self) -> Result<usize> {
        self.ballot.read(|tables| tables.users.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::password::cheap_hasher;
    use ballot_store::InMemoryTableStore;

    fn ballot() -> Ballot {
        Ballot::open(Arc::new(InMemoryTableStore::new()), Arc::new(cheap_hasher())).unwrap()
    }

    #[test]
    fn register_then_authenticate() {
        let ballot = ballot();
        let record = ballot
            .users()
            .register("ann@x.com", "Ann", "s3cret", "34", "f", "Oslo")
            .unwrap();
        assert_ne!(record.password_hash, "s3cret");

        let principal = ballot.users().authenticate("ann@x.com", "s3cret").unwrap();
        assert_eq!(principal.email, "ann@x.com");
        assert_eq!(principal.profile.name, "Ann");
        assert_eq!(principal.profile.city, "Oslo");
        assert_eq!(ballot.users().user_count().unwrap(), 1);
    }

    #[test]
    fn werkzeug_accounts_can_log_in() {
        let store = Arc::new(InMemoryTableStore::new());
        let users = serde_json::json!({
            "old@x.com": {
                "name": "Old", "age": "50", "gender": "m", "city": "Rome",
                "registered_at": "2024-05-01 09:00:00",
                "password": "pbkdf2:sha256:1000$Nq3pXyZbL0vRk2Ds$56bbe78b942388b946cda27866e4c6cdaff9c6ceab3f9ef3fdb296f2d5c4b67f"
            }
        });
        let serde_json::Value::Object(users) = users else {
            unreachable!()
        };
        store.insert_raw(ballot_store::Table::Users, users).unwrap();

        let ballot = Ballot::open(store, Arc::new(cheap_hasher())).unwrap();
        let principal = ballot.users().authenticate("old@x.com", "pw").unwrap();
        assert_eq!(principal.profile.city, "Rome");
        assert!(matches!(
            ballot.users().authenticate("old@x.com", "nope"),
            Err(BallotError::Authentication)
        ));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let ballot = ballot();
        let users = ballot.users();
        for args in [
            ["", "Ann", "pw", "34", "f", "Oslo"],
            ["a@x.com", "  ", "pw", "34", "f", "Oslo"],
            ["a@x.com", "Ann", "", "34", "f", "Oslo"],
            ["a@x.com", "Ann", "pw", "", "f", "Oslo"],
            ["a@x.com", "Ann", "pw", "34", "\t", "Oslo"],
            ["a@x.com", "Ann", "pw", "34", "f", ""],
        ] {
            let err = users
                .register(args[0], args[1], args[2], args[3], args[4], args[5])
                .unwrap_err();
            assert!(matches!(err, BallotError::Validation(_)), "{args:?}");
        }
        assert_eq!(users.user_count().unwrap(), 0);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let ballot = ballot();
        let users = ballot.users();
        users.register("a@x.com", "A", "pw", "1", "f", "X").unwrap();
        let err = users.register("a@x.com", "B", "pw2", "2", "m", "Y").unwrap_err();
        assert!(matches!(err, BallotError::DuplicateUser(_)));
        assert_eq!(users.get_user("a@x.com").unwrap().unwrap().name, "A");
    }

    #[test]
    fn emails_are_case_sensitive() {
        let ballot = ballot();
        let users = ballot.users();
        users.register("a@x.com", "A", "pw", "1", "f", "X").unwrap();
        users.register("A@x.com", "B", "pw", "1", "f", "X").unwrap();
        assert_eq!(users.user_count().unwrap(), 2);
    }

    #[test]
    fn unknown_email_and_wrong_password_look_the_same() {
        let ballot = ballot();
        let users = ballot.users();
        users.register("a@x.com", "A", "pw", "1", "f", "X").unwrap();

        let wrong_password = users.authenticate("a@x.com", "nope").unwrap_err();
        let unknown_email = users.authenticate("b@x.com", "pw").unwrap_err();
        assert!(matches!(wrong_password, BallotError::Authentication));
        assert!(matches!(unknown_email, BallotError::Authentication));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }
}
