/*!
Account records and the line formats they persist in.

Each role's backing file holds one record per line:

```text
admin.txt, headminister.txt:    username:password
users.txt:                      id:username:password:balance|address|phone
guidance.txt:                   username:password:phone:department
```
*/
use std::io::Read;

/// Placeholder stored for a contact field the account holder never gave.
pub const NOT_PROVIDED: &str = "Not Provided";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Role {
    Admin,
    Student,
    Guidance,
    HeadAdmin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let token = match self {
            Role::Admin     => "Admin",
            Role::Student   => "Student",
            Role::Guidance  => "Guidance",
            Role::HeadAdmin => "HeadAdmin",
        };

        write!(f, "{}", token)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin"     => Ok(Role::Admin),
            "Student"   => Ok(Role::Student),
            "Guidance"  => Ok(Role::Guidance),
            "HeadAdmin" => Ok(Role::HeadAdmin),
            _ => Err(format!("{:?} is not a valid Role.", s)),
        }
    }
}

/// Departments a guidance account can belong to.
///
/// Note the set offered here is not the set of aid types a request can
/// carry: "Counseling" is spelled without the double l, and there is no
/// "Scholarship" aid type at all. The review gate compares rendered
/// strings verbatim, so those two departments can never clear a request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Department {
    Finance,
    Scholarship,
    Hostel,
    Counseling,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Finance     => "Finance",
            Department::Scholarship => "Scholarship",
            Department::Hostel      => "Hostel",
            Department::Counseling  => "Counseling",
        }
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Department {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Finance"     => Ok(Department::Finance),
            "Scholarship" => Ok(Department::Scholarship),
            "Hostel"      => Ok(Department::Hostel),
            "Counseling"  => Ok(Department::Counseling),
            _ => Err(format!("{:?} is not a valid Department.", s)),
        }
    }
}

/// An administrator or head-administrator credential pair.
///
/// Both roles persist in the same two-field format; which file a record
/// was loaded from decides which of the two it is.
#[derive(Clone, Debug, PartialEq)]
pub struct AdminRecord {
    pub username: String,
    pub password: String,
}

impl AdminRecord {
    pub fn from_line(line: &str) -> Result<AdminRecord, String> {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != 2 {
            return Err(format!(
                "expected 2 colon-separated fields, got {}", parts.len()
            ));
        }

        Ok(AdminRecord {
            username: parts[0].to_owned(),
            password: parts[1].to_owned(),
        })
    }

    pub fn to_line(&self) -> String {
        format!("{}:{}", &self.username, &self.password)
    }
}

/// Decode rule for the optional student contact subfields: absent or
/// the literal placeholder `-` both read back as [`NOT_PROVIDED`].
fn contact_field(part: Option<&str>) -> String {
    match part {
        None | Some("-") => NOT_PROVIDED.to_owned(),
        Some(s) => s.to_owned(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StudentRecord {
    /// Store key; stays fixed even when the display `username` changes.
    pub id: String,
    pub username: String,
    pub password: String,
    pub balance: f64,
    pub address: String,
    pub phone: String,
}

impl StudentRecord {
    /// Decodes one `users.txt` line.
    ///
    /// Lines with fewer than four colon fields are rejected; anything
    /// past the fourth is discarded. The fourth field is pipe-delimited
    /// into balance, address, and phone.
    pub fn from_line(line: &str) -> Result<StudentRecord, String> {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 4 {
            return Err(format!(
                "expected at least 4 colon-separated fields, got {}", parts.len()
            ));
        }

        let subfields: Vec<&str> = parts[3].split('|').collect();
        let balance: f64 = subfields[0].parse().map_err(|_| format!(
            "unparseable balance {:?}", subfields[0]
        ))?;

        Ok(StudentRecord {
            id: parts[0].to_owned(),
            username: parts[1].to_owned(),
            password: parts[2].to_owned(),
            balance,
            address: contact_field(subfields.get(1).copied()),
            phone: contact_field(subfields.get(2).copied()),
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}|{}|{}",
            &self.id, &self.username, &self.password,
            self.balance, &self.address, &self.phone
        )
    }

    /**
    Student .csv rows for bulk onboarding should look like this

    ```csv
    #id,  username, password, address,    phone
    A1,   alice,    pw1,      12 Main St, 555-1111
    ```

    `address` and `phone` take the `-` placeholder when unknown; the
    opening balance is always zero.
    */
    pub fn from_csv_line(
        row: &csv::StringRecord
    ) -> Result<StudentRecord, &'static str> {
        log::trace!("StudentRecord::from_csv_line( {:?} ) called.", row);

        let id = match row.get(0) {
            Some(s) => s.to_owned(),
            None => { return Err("no id"); },
        };
        let username = match row.get(1) {
            Some(s) => s.to_owned(),
            None => { return Err("no username"); },
        };
        let password = match row.get(2) {
            Some(s) => s.to_owned(),
            None => { return Err("no password"); },
        };

        Ok(StudentRecord {
            id,
            username,
            password,
            balance: 0.0,
            address: contact_field(row.get(3)),
            phone: contact_field(row.get(4)),
        })
    }

    pub fn vec_from_csv_reader<R: Read>(r: R) -> Result<Vec<StudentRecord>, String> {
        log::trace!("StudentRecord::vec_from_csv_reader(...) called.");

        let mut csv_reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .flexible(false)
            .has_headers(false)
            .from_reader(r);

        let mut students: Vec<StudentRecord> = Vec::new();

        for (n, res) in csv_reader.records().enumerate() {
            match res {
                Ok(record) => match StudentRecord::from_csv_line(&record) {
                    Ok(stud) => { students.push(stud); },
                    Err(e) => {
                        let estr = match record.position() {
                            Some(p) => format!(
                                "Error on line {}: {}", p.line(), &e
                            ),
                            None => format!(
                                "Error in CSV record {}: {}", &n, &e
                            ),
                        };
                        return Err(estr);
                    },
                },
                Err(e) => {
                    let estr = match e.position() {
                        Some(p) => format!(
                            "Error on line {}: {}", p.line(), &e
                        ),
                        None => format!(
                            "Error in CSV record {}: {}", &n, &e
                        ),
                    };
                    return Err(estr);
                }
            }
        }

        log::trace!(
            "StudentRecord::vec_from_csv_reader() returns {} records.",
            students.len()
        );
        Ok(students)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GuidanceRecord {
    /// Store key. Renaming a guidance account re-keys its store entry.
    pub username: String,
    pub password: String,
    pub phone: String,
    pub department: Department,
}

impl GuidanceRecord {
    pub fn from_line(line: &str) -> Result<GuidanceRecord, String> {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != 4 {
            return Err(format!(
                "expected 4 colon-separated fields, got {}", parts.len()
            ));
        }

        Ok(GuidanceRecord {
            username: parts[0].to_owned(),
            password: parts[1].to_owned(),
            phone: parts[2].to_owned(),
            department: parts[3].parse()?,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            &self.username, &self.password, &self.phone, self.department
        )
    }
}

/// A record plus the role store it was found in; what a successful
/// login hands back to the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum Account {
    Admin(AdminRecord),
    Student(StudentRecord),
    Guidance(GuidanceRecord),
    HeadAdmin(AdminRecord),
}

impl Account {
    pub fn username(&self) -> &str {
        match self {
            Account::Admin(a) => &a.username,
            Account::Student(s) => &s.username,
            Account::Guidance(g) => &g.username,
            Account::HeadAdmin(a) => &a.username,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Admin(_) => Role::Admin,
            Account::Student(_) => Role::Student,
            Account::Guidance(_) => Role::Guidance,
            Account::HeadAdmin(_) => Role::HeadAdmin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    use float_cmp::approx_eq;

    #[test]
    fn admin_line_round_trip() {
        let rec = AdminRecord {
            username: "thelma".to_owned(),
            password: "hunter2".to_owned(),
        };
        assert_eq!(AdminRecord::from_line(&rec.to_line()).unwrap(), rec);

        assert!(AdminRecord::from_line("thelma").is_err());
        assert!(AdminRecord::from_line("thelma:hunter2:extra").is_err());
    }

    #[test]
    fn student_line_decodes() {
        let rec = StudentRecord::from_line(
            "A1:alice:pw1:100.0|12 Main St|555-1111"
        ).unwrap();

        assert_eq!(rec.id, "A1");
        assert_eq!(rec.username, "alice");
        assert_eq!(rec.password, "pw1");
        assert!(approx_eq!(f64, rec.balance, 100.0));
        assert_eq!(rec.address, "12 Main St");
        assert_eq!(rec.phone, "555-1111");
    }

    #[test]
    fn student_contact_placeholders() {
        let rec = StudentRecord::from_line("A2:bob:pw2:0.0|-|-").unwrap();
        assert_eq!(rec.address, NOT_PROVIDED);
        assert_eq!(rec.phone, NOT_PROVIDED);

        // A bare balance with no pipes at all reads the same way.
        let rec = StudentRecord::from_line("A3:carmen:pw3:25.5").unwrap();
        assert!(approx_eq!(f64, rec.balance, 25.5));
        assert_eq!(rec.address, NOT_PROVIDED);
        assert_eq!(rec.phone, NOT_PROVIDED);
    }

    #[test]
    fn student_line_round_trip() {
        let rec = StudentRecord {
            id: "A7".to_owned(),
            username: "dana".to_owned(),
            password: "pw7".to_owned(),
            balance: 12.5,
            address: "3 Elm Rd".to_owned(),
            phone: NOT_PROVIDED.to_owned(),
        };
        assert_eq!(StudentRecord::from_line(&rec.to_line()).unwrap(), rec);
    }

    #[test]
    fn student_line_rejects() {
        // Too few colon fields.
        assert!(StudentRecord::from_line("A1:alice:pw1").is_err());
        // Unparseable balance.
        assert!(StudentRecord::from_line("A1:alice:pw1:lots|x|y").is_err());
    }

    #[test]
    fn student_line_discards_extra_fields() {
        // A fifth colon field is ignored rather than rejected.
        let rec = StudentRecord::from_line(
            "A1:alice:pw1:1.0|a|b:leftover"
        ).unwrap();
        assert_eq!(rec.id, "A1");
        assert!(approx_eq!(f64, rec.balance, 1.0));
    }

    #[test]
    fn guidance_line_round_trip() {
        let rec = GuidanceRecord {
            username: "gwen".to_owned(),
            password: "pwg".to_owned(),
            phone: "555-9000".to_owned(),
            department: Department::Finance,
        };
        assert_eq!(GuidanceRecord::from_line(&rec.to_line()).unwrap(), rec);

        assert!(GuidanceRecord::from_line("gwen:pwg:555-9000").is_err());
        assert!(GuidanceRecord::from_line("gwen:pwg:555-9000:Astrology").is_err());
    }

    #[test]
    fn department_tokens() {
        for dept in [
            Department::Finance, Department::Scholarship,
            Department::Hostel, Department::Counseling,
        ] {
            let parsed: Department = dept.as_str().parse().unwrap();
            assert_eq!(parsed, dept);
        }
        // The aid-type spelling, not a department.
        assert!("Counselling".parse::<Department>().is_err());
    }

    #[test]
    fn students_from_csv() {
        ensure_logging();
        let f = std::fs::File::open("test/good_students_0.csv").unwrap();
        let studs = StudentRecord::vec_from_csv_reader(f).unwrap();
        log::trace!("Students:\n{:#?}", &studs);

        assert_eq!(studs.len(), 3);
        assert_eq!(studs[0].id, "A1");
        assert_eq!(studs[0].address, "12 Main St");
        assert!(approx_eq!(f64, studs[0].balance, 0.0));
        assert_eq!(studs[1].phone, NOT_PROVIDED);
    }
}
