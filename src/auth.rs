/*!
Credential checking against the account stores.

Passwords are stored and compared as plain strings. That is a known
weakness of the system this one replaces, carried forward deliberately
rather than half-fixed here.
*/
use crate::account::Account;
use crate::store::accounts::AccountStore;

/// The one thing a failed login reveals: nothing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AuthError;

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "invalid ID or password")
    }
}

impl std::error::Error for AuthError {}

impl AccountStore {
    /// Checks a credential against each role store in turn:
    /// administrators, then students (who log in with their *id*, not
    /// their display username), then guidance, then head
    /// administrators. A key match with the wrong password falls
    /// through to the next store rather than stopping the scan.
    pub fn login(&self, username: &str, password: &str) -> Result<Account, AuthError> {
        log::trace!("AccountStore::login( {:?} ) called.", username);

        if let Some(rec) = self.admins().get(username) {
            if rec.password == password {
                return Ok(Account::Admin(rec.clone()));
            }
        }
        if let Some(rec) = self.students().get(username) {
            if rec.password == password {
                return Ok(Account::Student(rec.clone()));
            }
        }
        if let Some(rec) = self.guidance().get(username) {
            if rec.password == password {
                return Ok(Account::Guidance(rec.clone()));
            }
        }
        if let Some(rec) = self.head_admins().get(username) {
            if rec.password == password {
                return Ok(Account::HeadAdmin(rec.clone()));
            }
        }

        log::info!("Failed login attempt for {:?}.", username);
        Err(AuthError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::*;
    use crate::tests::ensure_logging;

    use tempfile::{tempdir, TempDir};

    fn seeded_store() -> (TempDir, AccountStore) {
        ensure_logging();
        let dir = tempdir().unwrap();
        let mut store = AccountStore::load(dir.path()).unwrap();

        store.insert_admin(AdminRecord {
            username: "admin".to_owned(),
            password: "root_pw".to_owned(),
        }).unwrap();
        store.insert_head_admin(AdminRecord {
            username: "head".to_owned(),
            password: "head_pw".to_owned(),
        }).unwrap();
        store.insert_student(StudentRecord {
            id: "A1".to_owned(),
            username: "alice".to_owned(),
            password: "pw1".to_owned(),
            balance: 0.0,
            address: NOT_PROVIDED.to_owned(),
            phone: NOT_PROVIDED.to_owned(),
        }).unwrap();
        store.insert_guidance(GuidanceRecord {
            username: "gwen".to_owned(),
            password: "pwg".to_owned(),
            phone: "555-9000".to_owned(),
            department: Department::Finance,
        }).unwrap();

        (dir, store)
    }

    #[test]
    fn each_role_logs_in_from_its_own_store() {
        let (_dir, store) = seeded_store();

        assert_eq!(store.login("admin", "root_pw").unwrap().role(), Role::Admin);
        assert_eq!(store.login("gwen", "pwg").unwrap().role(), Role::Guidance);
        assert_eq!(store.login("head", "head_pw").unwrap().role(), Role::HeadAdmin);
    }

    #[test]
    fn students_log_in_by_id() {
        let (_dir, store) = seeded_store();

        let account = store.login("A1", "pw1").unwrap();
        assert_eq!(account.role(), Role::Student);
        assert_eq!(account.username(), "alice");

        // The display username is not a login key.
        assert_eq!(store.login("alice", "pw1"), Err(AuthError));
    }

    #[test]
    fn bad_credentials_are_rejected() {
        let (_dir, store) = seeded_store();

        assert_eq!(store.login("admin", "wrong"), Err(AuthError));
        assert_eq!(store.login("nobody", "root_pw"), Err(AuthError));
    }
}
