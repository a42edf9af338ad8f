/*!
`AccountStore`: the four role-partitioned account maps and their
backing files.

```text
admin.txt         username:password           keyed by username
users.txt         id:username:password:...    keyed by id
guidance.txt      username:password:...       keyed by username
headminister.txt  username:password           keyed by username
```

Inserts append one line; every other mutation regenerates the whole
file from the in-memory map. A failed write leaves the in-memory map
exactly as it was before the operation.
*/
use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use super::{append_line, rewrite_lines, StoreError};
use crate::account::*;

pub const ADMIN_FILE: &str = "admin.txt";
pub const USER_FILE: &str = "users.txt";
pub const GUIDANCE_FILE: &str = "guidance.txt";
pub const HEADMIN_FILE: &str = "headminister.txt";

/// Unsupplied fields carry forward from the stored record; a student's
/// balance in particular survives every update that doesn't name it.
#[derive(Clone, Debug, Default)]
pub struct StudentPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub balance: Option<f64>,
}

/// The username is the store key for administrator records, so it is
/// not patchable; only the password can change in place.
#[derive(Clone, Debug, Default)]
pub struct AdminPatch {
    pub password: Option<String>,
}

/// Guidance accounts are keyed by username, so a patch carrying a new
/// username re-keys the store entry.
#[derive(Clone, Debug, Default)]
pub struct GuidancePatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub department: Option<Department>,
}

pub struct AccountStore {
    base_dir: PathBuf,
    admins: HashMap<String, AdminRecord>,
    students: HashMap<String, StudentRecord>,
    guidance: HashMap<String, GuidanceRecord>,
    head_admins: HashMap<String, AdminRecord>,
    /// Highest `A<n>` suffix ever seen; registration ids come from
    /// here rather than from the map's current size, so deleting a
    /// student can never free an id up for reuse.
    next_student_seq: u64,
}

/// Reads one backing file through `decode`, one record per line.
///
/// A missing file is an empty store, not an error. A line that fails
/// to decode is logged and skipped; the load always finishes.
fn load_lines<T, F>(path: &Path, decode: F) -> Result<Vec<T>, StoreError>
where
    F: Fn(&str) -> Result<T, String>,
{
    log::trace!("load_lines( {:?} ) called.", path);

    let contents = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("{:?} not found; starting empty.", path);
            return Ok(Vec::new());
        },
        Err(e) => { return Err(e.into()); },
    };

    let mut records = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match decode(line) {
            Ok(rec) => { records.push(rec); },
            Err(e) => {
                log::warn!("Skipping line {:?} in {:?}: {}", line, path, &e);
            },
        }
    }

    Ok(records)
}

impl AccountStore {
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<AccountStore, StoreError> {
        let base_dir = base_dir.as_ref().to_owned();
        log::trace!("AccountStore::load( {:?} ) called.", &base_dir);

        let admins: HashMap<String, AdminRecord> =
            load_lines(&base_dir.join(ADMIN_FILE), AdminRecord::from_line)?
                .into_iter()
                .map(|a| (a.username.clone(), a))
                .collect();
        let students: HashMap<String, StudentRecord> =
            load_lines(&base_dir.join(USER_FILE), StudentRecord::from_line)?
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect();
        let guidance: HashMap<String, GuidanceRecord> =
            load_lines(&base_dir.join(GUIDANCE_FILE), GuidanceRecord::from_line)?
                .into_iter()
                .map(|g| (g.username.clone(), g))
                .collect();
        let head_admins: HashMap<String, AdminRecord> =
            load_lines(&base_dir.join(HEADMIN_FILE), AdminRecord::from_line)?
                .into_iter()
                .map(|a| (a.username.clone(), a))
                .collect();

        let next_student_seq = students.keys()
            .filter_map(|id| id.strip_prefix('A'))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);

        log::info!(
            "Loaded {} admin, {} student, {} guidance, {} head-admin records.",
            admins.len(), students.len(), guidance.len(), head_admins.len()
        );

        Ok(AccountStore {
            base_dir,
            admins,
            students,
            guidance,
            head_admins,
            next_student_seq,
        })
    }

    pub fn admins(&self) -> &HashMap<String, AdminRecord> { &self.admins }
    pub fn students(&self) -> &HashMap<String, StudentRecord> { &self.students }
    pub fn guidance(&self) -> &HashMap<String, GuidanceRecord> { &self.guidance }
    pub fn head_admins(&self) -> &HashMap<String, AdminRecord> { &self.head_admins }

    pub fn get_student(&self, id: &str) -> Option<&StudentRecord> {
        self.students.get(id)
    }

    pub fn get_guidance(&self, username: &str) -> Option<&GuidanceRecord> {
        self.guidance.get(username)
    }

    fn persist_admins(&self) -> Result<(), StoreError> {
        rewrite_lines(
            &self.base_dir.join(ADMIN_FILE),
            self.admins.values().map(AdminRecord::to_line),
        )
    }

    fn persist_head_admins(&self) -> Result<(), StoreError> {
        rewrite_lines(
            &self.base_dir.join(HEADMIN_FILE),
            self.head_admins.values().map(AdminRecord::to_line),
        )
    }

    fn persist_students(&self) -> Result<(), StoreError> {
        rewrite_lines(
            &self.base_dir.join(USER_FILE),
            self.students.values().map(StudentRecord::to_line),
        )
    }

    fn persist_guidance(&self) -> Result<(), StoreError> {
        rewrite_lines(
            &self.base_dir.join(GUIDANCE_FILE),
            self.guidance.values().map(GuidanceRecord::to_line),
        )
    }

    pub fn insert_admin(&mut self, rec: AdminRecord) -> Result<(), StoreError> {
        log::trace!("AccountStore::insert_admin( {:?} ) called.", &rec.username);

        if self.admins.contains_key(&rec.username) {
            return Err(StoreError::DuplicateKey(rec.username));
        }
        append_line(&self.base_dir.join(ADMIN_FILE), &rec.to_line())?;
        self.admins.insert(rec.username.clone(), rec);
        Ok(())
    }

    pub fn insert_head_admin(&mut self, rec: AdminRecord) -> Result<(), StoreError> {
        log::trace!("AccountStore::insert_head_admin( {:?} ) called.", &rec.username);

        if self.head_admins.contains_key(&rec.username) {
            return Err(StoreError::DuplicateKey(rec.username));
        }
        append_line(&self.base_dir.join(HEADMIN_FILE), &rec.to_line())?;
        self.head_admins.insert(rec.username.clone(), rec);
        Ok(())
    }

    pub fn update_admin(
        &mut self,
        username: &str,
        patch: AdminPatch,
    ) -> Result<(), StoreError> {
        log::trace!("AccountStore::update_admin( {:?} ) called.", username);

        let rec = match self.admins.get_mut(username) {
            Some(rec) => rec,
            None => { return Err(StoreError::NotFound(username.to_owned())); },
        };
        let prev = rec.clone();

        if let Some(password) = patch.password { rec.password = password; }

        if let Err(e) = self.persist_admins() {
            self.admins.insert(username.to_owned(), prev);
            return Err(e);
        }
        Ok(())
    }

    pub fn delete_admin(&mut self, username: &str) -> Result<(), StoreError> {
        log::trace!("AccountStore::delete_admin( {:?} ) called.", username);

        let removed = match self.admins.remove(username) {
            Some(rec) => rec,
            None => { return Err(StoreError::NotFound(username.to_owned())); },
        };

        if let Err(e) = self.persist_admins() {
            self.admins.insert(removed.username.clone(), removed);
            return Err(e);
        }
        Ok(())
    }

    pub fn update_head_admin(
        &mut self,
        username: &str,
        patch: AdminPatch,
    ) -> Result<(), StoreError> {
        log::trace!("AccountStore::update_head_admin( {:?} ) called.", username);

        let rec = match self.head_admins.get_mut(username) {
            Some(rec) => rec,
            None => { return Err(StoreError::NotFound(username.to_owned())); },
        };
        let prev = rec.clone();

        if let Some(password) = patch.password { rec.password = password; }

        if let Err(e) = self.persist_head_admins() {
            self.head_admins.insert(username.to_owned(), prev);
            return Err(e);
        }
        Ok(())
    }

    pub fn delete_head_admin(&mut self, username: &str) -> Result<(), StoreError> {
        log::trace!("AccountStore::delete_head_admin( {:?} ) called.", username);

        let removed = match self.head_admins.remove(username) {
            Some(rec) => rec,
            None => { return Err(StoreError::NotFound(username.to_owned())); },
        };

        if let Err(e) = self.persist_head_admins() {
            self.head_admins.insert(removed.username.clone(), removed);
            return Err(e);
        }
        Ok(())
    }

    /// Remembers a student id so later registrations can't collide
    /// with it.
    fn note_student_id(&mut self, id: &str) {
        if let Some(n) = id.strip_prefix('A').and_then(|n| n.parse::<u64>().ok()) {
            if n > self.next_student_seq {
                self.next_student_seq = n;
            }
        }
    }

    pub fn insert_student(&mut self, rec: StudentRecord) -> Result<(), StoreError> {
        log::trace!("AccountStore::insert_student( {:?} ) called.", &rec.id);

        if self.students.contains_key(&rec.id) {
            return Err(StoreError::DuplicateKey(rec.id));
        }
        append_line(&self.base_dir.join(USER_FILE), &rec.to_line())?;
        self.note_student_id(&rec.id);
        self.students.insert(rec.id.clone(), rec);
        Ok(())
    }

    /// Inserts a batch of students, typically from a CSV import.
    ///
    /// The whole batch is rejected up front if any row's id is already
    /// in use (or appears twice in the batch); the error message lists
    /// every collision.
    pub fn insert_students(
        &mut self,
        students: Vec<StudentRecord>,
    ) -> Result<usize, StoreError> {
        log::trace!(
            "AccountStore::insert_students( [ {} students ] ) called.",
            students.len()
        );

        let mut seen: Vec<&str> = Vec::with_capacity(students.len());
        let mut collisions = String::new();
        for s in students.iter() {
            if self.students.contains_key(&s.id) || seen.contains(&s.id.as_str()) {
                write!(&mut collisions, " {}", &s.id)
                    .map_err(|e| StoreError::Io(format!("{}", &e)))?;
            }
            seen.push(&s.id);
        }
        if !collisions.is_empty() {
            return Err(StoreError::DuplicateKey(format!(
                "ids already in use:{}", collisions
            )));
        }

        let n = students.len();
        for s in students {
            append_line(&self.base_dir.join(USER_FILE), &s.to_line())?;
            self.note_student_id(&s.id);
            self.students.insert(s.id.clone(), s);
        }

        log::trace!("Inserted {} student records.", n);
        Ok(n)
    }

    pub fn insert_guidance(&mut self, rec: GuidanceRecord) -> Result<(), StoreError> {
        log::trace!("AccountStore::insert_guidance( {:?} ) called.", &rec.username);

        if self.guidance.contains_key(&rec.username) {
            return Err(StoreError::DuplicateKey(rec.username));
        }
        append_line(&self.base_dir.join(GUIDANCE_FILE), &rec.to_line())?;
        self.guidance.insert(rec.username.clone(), rec);
        Ok(())
    }

    /// Student self-registration.
    ///
    /// The username must be free across the student store (this is the
    /// only place that's checked); blank contact fields become the
    /// "Not Provided" sentinel; the balance opens at zero.
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        phone: &str,
        address: &str,
    ) -> Result<String, StoreError> {
        log::trace!("AccountStore::register( {:?} ) called.", username);

        if self.students.values().any(|s| s.username == username) {
            return Err(StoreError::DuplicateKey(username.to_owned()));
        }

        let id = format!("A{}", self.next_student_seq + 1);
        let contact = |s: &str| match s.trim() {
            "" => NOT_PROVIDED.to_owned(),
            x => x.to_owned(),
        };
        let rec = StudentRecord {
            id: id.clone(),
            username: username.to_owned(),
            password: password.to_owned(),
            balance: 0.0,
            address: contact(address),
            phone: contact(phone),
        };
        self.insert_student(rec)?;

        log::info!("Registered student {:?} as {}.", username, &id);
        Ok(id)
    }

    pub fn update_student(
        &mut self,
        id: &str,
        patch: StudentPatch,
    ) -> Result<(), StoreError> {
        log::trace!("AccountStore::update_student( {:?} ) called.", id);

        let rec = match self.students.get_mut(id) {
            Some(rec) => rec,
            None => { return Err(StoreError::NotFound(id.to_owned())); },
        };
        let prev = rec.clone();

        if let Some(username) = patch.username { rec.username = username; }
        if let Some(password) = patch.password { rec.password = password; }
        if let Some(address) = patch.address { rec.address = address; }
        if let Some(phone) = patch.phone { rec.phone = phone; }
        if let Some(balance) = patch.balance { rec.balance = balance; }

        if let Err(e) = self.persist_students() {
            self.students.insert(id.to_owned(), prev);
            return Err(e);
        }
        Ok(())
    }

    pub fn delete_student(&mut self, id: &str) -> Result<(), StoreError> {
        log::trace!("AccountStore::delete_student( {:?} ) called.", id);

        let removed = match self.students.remove(id) {
            Some(rec) => rec,
            None => { return Err(StoreError::NotFound(id.to_owned())); },
        };

        if let Err(e) = self.persist_students() {
            self.students.insert(removed.id.clone(), removed);
            return Err(e);
        }
        Ok(())
    }

    pub fn update_guidance(
        &mut self,
        username: &str,
        patch: GuidancePatch,
    ) -> Result<(), StoreError> {
        log::trace!("AccountStore::update_guidance( {:?} ) called.", username);

        if !self.guidance.contains_key(username) {
            return Err(StoreError::NotFound(username.to_owned()));
        }

        let new_username = patch.username.unwrap_or_else(|| username.to_owned());
        if new_username != username && self.guidance.contains_key(&new_username) {
            return Err(StoreError::DuplicateKey(new_username));
        }

        // Re-key: the old entry comes out before the new one lands, so
        // the map never holds both usernames for the same account.
        let prev = match self.guidance.remove(username) {
            Some(rec) => rec,
            None => { return Err(StoreError::NotFound(username.to_owned())); },
        };

        let mut updated = prev.clone();
        updated.username = new_username.clone();
        if let Some(password) = patch.password { updated.password = password; }
        if let Some(phone) = patch.phone { updated.phone = phone; }
        if let Some(department) = patch.department { updated.department = department; }

        self.guidance.insert(new_username.clone(), updated);

        if let Err(e) = self.persist_guidance() {
            self.guidance.remove(&new_username);
            self.guidance.insert(username.to_owned(), prev);
            return Err(e);
        }
        Ok(())
    }

    /// Moves a guidance record to a new username (and therefore a new
    /// store key).
    pub fn rename_guidance(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        log::trace!(
            "AccountStore::rename_guidance( {:?}, {:?} ) called.", old, new
        );

        self.update_guidance(old, GuidancePatch {
            username: Some(new.to_owned()),
            ..GuidancePatch::default()
        })
    }

    pub fn delete_guidance(&mut self, username: &str) -> Result<(), StoreError> {
        log::trace!("AccountStore::delete_guidance( {:?} ) called.", username);

        let removed = match self.guidance.remove(username) {
            Some(rec) => rec,
            None => { return Err(StoreError::NotFound(username.to_owned())); },
        };

        if let Err(e) = self.persist_guidance() {
            self.guidance.insert(removed.username.clone(), removed);
            return Err(e);
        }
        Ok(())
    }
}
