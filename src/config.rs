/*!
Configuration and startup wiring.

The stores get constructed here, once, against the configured base
directory, and travel together in a [`Glob`] that the presentation
layer receives by reference. Nothing else in the crate holds global
state.
*/
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::account::AdminRecord;
use crate::store::accounts::AccountStore;
use crate::store::docs::DocumentStore;
use crate::store::requests::RequestStore;

#[derive(Deserialize)]
struct ConfigFile {
    base_dir: Option<String>,
    admin_uname: Option<String>,
    admin_password: Option<String>,
}

#[derive(Debug)]
pub struct Cfg {
    /// Directory holding the backing files and the uploads directory.
    pub base_dir: PathBuf,
    pub default_admin_uname: String,
    pub default_admin_password: String,
}

impl std::default::Default for Cfg {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            default_admin_uname: "admin".to_owned(),
            default_admin_password: "admin".to_owned(),
        }
    }
}

impl Cfg {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let file_contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Unable to read config file: {}", &e))?;
        let cf: ConfigFile = toml::from_str(&file_contents)
            .map_err(|e| format!("Unable to deserialize config file: {}", &e))?;

        let mut c = Self::default();

        if let Some(s) = cf.base_dir {
            c.base_dir = PathBuf::from(s);
        }
        if let Some(s) = cf.admin_uname {
            c.default_admin_uname = s;
        }
        if let Some(s) = cf.admin_password {
            c.default_admin_password = s;
        }

        Ok(c)
    }
}

/// The stores, constructed once at startup and handed to whoever
/// drives the session.
pub struct Glob {
    pub accounts: AccountStore,
    pub requests: RequestStore,
    pub docs: DocumentStore,
}

impl Glob {
    /// Builds the stores against `cfg.base_dir` and assures the
    /// existence of the default administrator account, so a fresh data
    /// directory is immediately sign-in-able.
    pub fn from_cfg(cfg: Cfg) -> Result<Glob, String> {
        log::trace!("Glob::from_cfg( {:?} ) called.", &cfg);

        let mut accounts = AccountStore::load(&cfg.base_dir)
            .map_err(|e| format!("Unable to load account stores: {}", &e))?;

        if !accounts.admins().contains_key(&cfg.default_admin_uname) {
            log::info!(
                "Default admin ({}) doesn't exist; inserting.",
                &cfg.default_admin_uname
            );
            accounts.insert_admin(AdminRecord {
                username: cfg.default_admin_uname.clone(),
                password: cfg.default_admin_password.clone(),
            }).map_err(|e| format!("Unable to insert default admin: {}", &e))?;
        }

        let requests = RequestStore::load(&cfg.base_dir);
        let docs = DocumentStore::new(&cfg.base_dir);

        Ok(Glob { accounts, requests, docs })
    }
}

/// Loads system configuration and brings every store up behind it.
pub fn load_configuration<P: AsRef<Path>>(path: P) -> Result<Glob, String> {
    let cfg = Cfg::from_file(path.as_ref())?;
    log::info!("Configuration file read:\n{:#?}", &cfg);

    Glob::from_cfg(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    use std::fs;

    use tempfile::tempdir;

    #[test]
    fn config_file_overrides_defaults() {
        ensure_logging();
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("uniaid.toml");
        fs::write(
            &cfg_path,
            "base_dir = \"/srv/uniaid\"\nadmin_uname = \"thelma\"\n",
        ).unwrap();

        let cfg = Cfg::from_file(&cfg_path).unwrap();
        assert_eq!(cfg.base_dir, PathBuf::from("/srv/uniaid"));
        assert_eq!(cfg.default_admin_uname, "thelma");
        // Unset keys keep their defaults.
        assert_eq!(cfg.default_admin_password, "admin");

        assert!(Cfg::from_file(dir.path().join("nonexistent.toml")).is_err());
    }

    #[test]
    fn fresh_base_dir_gets_a_default_admin() {
        ensure_logging();
        let dir = tempdir().unwrap();
        let cfg = Cfg {
            base_dir: dir.path().to_owned(),
            ..Cfg::default()
        };

        let glob = Glob::from_cfg(cfg).unwrap();
        assert!(glob.accounts.login("admin", "admin").is_ok());

        // A second startup finds the admin already on disk and does
        // not duplicate it.
        let cfg = Cfg {
            base_dir: dir.path().to_owned(),
            ..Cfg::default()
        };
        let glob = Glob::from_cfg(cfg).unwrap();
        assert_eq!(glob.accounts.admins().len(), 1);
    }
}
