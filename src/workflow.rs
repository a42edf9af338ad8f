/*!
The review rule: who may decide a request, and when.

This is the only place business-level authorization happens. The
account store knows which map a credential came from and nothing more;
the request store will happily overwrite any status it's told to. The
gate in [`review`] is what stands between a guidance reviewer and a
request outside their department.
*/
use crate::account::Department;
use crate::request::{AidRequest, Decision, Status};
use crate::store::requests::RequestStore;
use crate::store::StoreError;

/// Whether a reviewer from `department` may decide a request routed by
/// `aid_type`. Verbatim, case-sensitive string equality: `Counseling`
/// never matches the `Counselling` aid type, and `Scholarship` has no
/// aid type at all, so reviewers in those departments can decide
/// nothing. That asymmetry is inherited data, not a rule to repair
/// here.
pub fn department_matches(department: Department, request: &AidRequest) -> bool {
    department.as_str() == request.aid_type.as_str()
}

/// Applies a reviewer's decision to a pending request.
///
/// Fails with `NotFound` for an unknown id, `AlreadyDecided` if the
/// request has left `Pending`, and `DepartmentMismatch` if the
/// reviewer's department doesn't route to the request's aid type. On
/// any failure the store is untouched. On success the new status is
/// persisted through the store and the updated record comes back.
pub fn review(
    store: &mut RequestStore,
    request_id: &str,
    department: Department,
    decision: Decision,
) -> Result<AidRequest, StoreError> {
    log::trace!(
        "review( {:?}, {}, {:?} ) called.", request_id, department, decision
    );

    let req = store.lookup(request_id)?;

    if req.status != Status::Pending {
        return Err(StoreError::AlreadyDecided {
            request_id: request_id.to_owned(),
            status: req.status,
        });
    }

    if !department_matches(department, req) {
        log::warn!(
            "{} reviewer tried to decide {} request {}.",
            department, req.aid_type, request_id
        );
        return Err(StoreError::DepartmentMismatch {
            department: department.to_string(),
            aid_type: req.aid_type.to_string(),
        });
    }

    store.set_status(request_id, decision.into())?;
    store.lookup(request_id).map(|req| req.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AidType;
    use crate::tests::ensure_logging;

    use tempfile::{tempdir, TempDir};

    fn store_with_requests() -> (TempDir, RequestStore, String, String) {
        ensure_logging();
        let dir = tempdir().unwrap();
        let mut store = RequestStore::load(dir.path());
        let finance = store.submit(
            "bob", AidType::Finance, "need funds", Vec::new()
        ).unwrap();
        let hostel = store.submit(
            "alice", AidType::Hostel, "room request", Vec::new()
        ).unwrap();
        (dir, store, finance, hostel)
    }

    #[test]
    fn matching_department_decides() {
        let (_dir, mut store, finance, _) = store_with_requests();

        let req = review(
            &mut store, &finance, Department::Finance, Decision::Accepted
        ).unwrap();
        assert_eq!(req.status, Status::Accepted);
        assert_eq!(store.lookup(&finance).unwrap().status, Status::Accepted);
    }

    #[test]
    fn wrong_department_changes_nothing() {
        let (_dir, mut store, _, hostel) = store_with_requests();

        match review(&mut store, &hostel, Department::Finance, Decision::Accepted) {
            Err(StoreError::DepartmentMismatch { department, aid_type }) => {
                assert_eq!(department, "Finance");
                assert_eq!(aid_type, "Hostel");
            },
            x => panic!("expected DepartmentMismatch, got {:?}", x),
        }
        assert_eq!(store.lookup(&hostel).unwrap().status, Status::Pending);
    }

    #[test]
    fn counseling_never_matches_counselling() {
        ensure_logging();
        let dir = tempdir().unwrap();
        let mut store = RequestStore::load(dir.path());
        let id = store.submit(
            "carmen", AidType::Counselling, "session request", Vec::new()
        ).unwrap();

        // Inherited spelling divergence: the department is spelled with
        // one l, the aid type with two. They never meet.
        assert!(review(
            &mut store, &id, Department::Counseling, Decision::Accepted
        ).is_err());
        assert!(review(
            &mut store, &id, Department::Scholarship, Decision::Accepted
        ).is_err());
        assert_eq!(store.lookup(&id).unwrap().status, Status::Pending);
    }

    #[test]
    fn decided_requests_stay_decided() {
        let (_dir, mut store, finance, _) = store_with_requests();

        review(&mut store, &finance, Department::Finance, Decision::Declined).unwrap();
        match review(&mut store, &finance, Department::Finance, Decision::Accepted) {
            Err(StoreError::AlreadyDecided { request_id, status }) => {
                assert_eq!(request_id, finance);
                assert_eq!(status, Status::Declined);
            },
            x => panic!("expected AlreadyDecided, got {:?}", x),
        }
        assert_eq!(store.lookup(&finance).unwrap().status, Status::Declined);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (_dir, mut store, _, _) = store_with_requests();

        match review(&mut store, "AID9999", Department::Finance, Decision::Accepted) {
            Err(StoreError::NotFound(k)) => { assert_eq!(k, "AID9999"); },
            x => panic!("expected NotFound, got {:?}", x),
        }
    }
}
