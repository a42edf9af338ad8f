/*!
`RequestStore`: the aid-request map and its JSON document.

The whole store persists as one JSON array in `aid_requests.txt`,
regenerated on every mutation. Requests are keyed (and ordered) by
their zero-padded ids, so map order and submission order coincide.
*/
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::StoreError;
use crate::request::{AidRequest, AidType, RequestSummary, Status};

pub const AID_REQUESTS_FILE: &str = "aid_requests.txt";

pub struct RequestStore {
    path: PathBuf,
    requests: BTreeMap<String, AidRequest>,
    /// Highest `AID<n>` suffix ever seen. Ids come from here, not from
    /// the map's size, so they stay unique for the life of the store.
    next_seq: u64,
}

impl RequestStore {
    /// Loads the JSON document under `base_dir`.
    ///
    /// An absent or empty file is an empty store. So is a file that
    /// fails to parse: the failure is logged and the caller gets a
    /// working (empty) store rather than an error.
    pub fn load<P: AsRef<Path>>(base_dir: P) -> RequestStore {
        let path = base_dir.as_ref().join(AID_REQUESTS_FILE);
        log::trace!("RequestStore::load( {:?} ) called.", &path);

        let mut store = RequestStore {
            path,
            requests: BTreeMap::new(),
            next_seq: 0,
        };

        let contents = match std::fs::read_to_string(&store.path) {
            Ok(s) => s,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::error!(
                        "Error reading {:?}: {}; starting empty.",
                        &store.path, &e
                    );
                }
                return store;
            },
        };
        if contents.trim().is_empty() {
            return store;
        }

        let parsed: Vec<AidRequest> = match serde_json::from_str(&contents) {
            Ok(reqs) => reqs,
            Err(e) => {
                log::error!(
                    "Error decoding JSON in {:?}: {}; starting empty.",
                    &store.path, &e
                );
                return store;
            },
        };

        for req in parsed {
            store.note_request_id(&req.request_id);
            store.requests.insert(req.request_id.clone(), req);
        }

        log::info!("Loaded {} aid requests.", store.requests.len());
        store
    }

    fn note_request_id(&mut self, id: &str) {
        if let Some(n) = id.strip_prefix("AID").and_then(|n| n.parse::<u64>().ok()) {
            if n > self.next_seq {
                self.next_seq = n;
            }
        }
    }

    /// The id the next submission will receive.
    pub fn next_id(&self) -> String {
        format!("AID{:04}", self.next_seq + 1)
    }

    pub fn requests(&self) -> &BTreeMap<String, AidRequest> {
        &self.requests
    }

    pub fn get(&self, request_id: &str) -> Option<&AidRequest> {
        self.requests.get(request_id)
    }

    pub fn lookup(&self, request_id: &str) -> Result<&AidRequest, StoreError> {
        self.requests.get(request_id)
            .ok_or_else(|| StoreError::NotFound(request_id.to_owned()))
    }

    /// Serializes the whole map, in order, over the backing file.
    fn persist(&self) -> Result<(), StoreError> {
        log::trace!("RequestStore::persist() called.");

        let all: Vec<&AidRequest> = self.requests.values().collect();
        let json = serde_json::to_string_pretty(&all)?;

        let mut file = File::create(&self.path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Records a new aid request and hands back its id.
    ///
    /// The status is forced to `Pending` no matter what the caller had
    /// in mind, and `username` is taken on faith; nothing checks it
    /// against the account store.
    pub fn submit(
        &mut self,
        username: &str,
        aid_type: AidType,
        description: &str,
        documents: Vec<String>,
    ) -> Result<String, StoreError> {
        log::trace!(
            "RequestStore::submit( {:?}, {}, .. ) called.", username, aid_type
        );

        let request_id = self.next_id();
        let req = AidRequest {
            request_id: request_id.clone(),
            username: username.to_owned(),
            aid_type,
            description: description.to_owned(),
            documents,
            status: Status::Pending,
        };
        self.requests.insert(request_id.clone(), req);

        if let Err(e) = self.persist() {
            self.requests.remove(&request_id);
            return Err(e);
        }
        self.note_request_id(&request_id);

        log::info!("Recorded aid request {}.", &request_id);
        Ok(request_id)
    }

    /// Overwrites a request's status. The department gate lives a
    /// level up, in [`crate::workflow::review`]; this is the raw store
    /// mutation.
    pub fn set_status(
        &mut self,
        request_id: &str,
        status: Status,
    ) -> Result<(), StoreError> {
        log::trace!(
            "RequestStore::set_status( {:?}, {} ) called.", request_id, status
        );

        let req = match self.requests.get_mut(request_id) {
            Some(req) => req,
            None => { return Err(StoreError::NotFound(request_id.to_owned())); },
        };
        let prev = req.status;
        req.status = status;

        if let Err(e) = self.persist() {
            if let Some(req) = self.requests.get_mut(request_id) {
                req.status = prev;
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn summary_counts(&self) -> RequestSummary {
        let mut summary = RequestSummary::default();
        for req in self.requests.values() {
            match req.status {
                Status::Pending  => { summary.pending += 1; },
                Status::Accepted => { summary.accepted += 1; },
                Status::Declined => { summary.declined += 1; },
            }
        }
        summary.total = self.requests.len();
        summary
    }
}
