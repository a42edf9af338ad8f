/*!
The `AidRequest` record and its status vocabulary.
*/
use serde::{Deserialize, Serialize};

/// Types of assistance a student can apply for.
///
/// Doubles as the routing key the review gate compares against a
/// guidance reviewer's department. Spelled exactly as offered at
/// submission time; see [`crate::account::Department`] for the
/// mismatched department-side set.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum AidType {
    Hostel,
    Counselling,
    Finance,
}

impl AidType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AidType::Hostel      => "Hostel",
            AidType::Counselling => "Counselling",
            AidType::Finance     => "Finance",
        }
    }
}

impl std::fmt::Display for AidType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AidType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hostel"      => Ok(AidType::Hostel),
            "Counselling" => Ok(AidType::Counselling),
            "Finance"     => Ok(AidType::Finance),
            _ => Err(format!("{:?} is not a valid AidType.", s)),
        }
    }
}

/// Lifecycle state of a request: `Pending` on submission, then exactly
/// one transition to a terminal state.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum Status {
    Pending,
    Accepted,
    Declined,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let token = match self {
            Status::Pending  => "Pending",
            Status::Accepted => "Accepted",
            Status::Declined => "Declined",
        };

        write!(f, "{}", token)
    }
}

/// The verdicts a reviewer can hand down. `Pending` is not one of them,
/// so a review can never send a request backwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decision {
    Accepted,
    Declined,
}

impl From<Decision> for Status {
    fn from(d: Decision) -> Status {
        match d {
            Decision::Accepted => Status::Accepted,
            Decision::Declined => Status::Declined,
        }
    }
}

/// One submitted aid application.
///
/// Field order here is the key order in the persisted JSON objects.
/// `documents` holds base-directory-relative paths handed out by the
/// document store; `username` is whatever the submitter typed and is
/// not checked against the account store.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AidRequest {
    pub request_id: String,
    pub username: String,
    pub aid_type: AidType,
    pub description: String,
    pub documents: Vec<String>,
    pub status: Status,
}

/// Per-status totals for the report screens.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RequestSummary {
    pub pending: usize,
    pub accepted: usize,
    pub declined: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aid_type_tokens() {
        for t in [AidType::Hostel, AidType::Counselling, AidType::Finance] {
            let parsed: AidType = t.as_str().parse().unwrap();
            assert_eq!(parsed, t);
        }
        // The department-side spelling doesn't parse as an aid type.
        assert!("Counseling".parse::<AidType>().is_err());
    }

    #[test]
    fn request_json_shape() {
        let req = AidRequest {
            request_id: "AID0001".to_owned(),
            username: "bob".to_owned(),
            aid_type: AidType::Finance,
            description: "need funds".to_owned(),
            documents: vec!["uploads/form-a1b2c3d4.pdf".to_owned()],
            status: Status::Pending,
        };

        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(
            json,
            r#"{"request_id":"AID0001","username":"bob","aid_type":"Finance","description":"need funds","documents":["uploads/form-a1b2c3d4.pdf"],"status":"Pending"}"#
        );

        let back: AidRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn decision_maps_to_terminal_status() {
        assert_eq!(Status::from(Decision::Accepted), Status::Accepted);
        assert_eq!(Status::from(Decision::Declined), Status::Declined);
    }
}
