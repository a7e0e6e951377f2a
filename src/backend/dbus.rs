//! System bus client for `org.baseurl.DnfSystem`.

use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use futures::{FutureExt, StreamExt};
use serde::Serialize;
use zbus::zvariant::{DynamicDeserialize, DynamicType};

use super::fault::BackendFault;
use super::types::{GpgConfirmation, GroupCategory, HistoryEntry, PackageFilter, PackageId, PackageInfo};
use super::{
    Backend, LOCK_REASON_LOCKED_BY_OTHER, LOCK_REASON_NOT_AUTHORIZED, LockReply, Resolution,
    RunReply, UndoReply, wire,
};
use crate::queue::{GroupAction, TransactionItem};

/// Well-known bus name of the daemon.
const DESTINATION: &str = "org.baseurl.DnfSystem";
/// Object path of the daemon.
const OBJECT_PATH: &str = "/";
/// Interface carrying every method and signal used here.
const INTERFACE: &str = "org.baseurl.DnfSystem";
/// Signal emitted when a signing key needs confirmation.
const GPG_SIGNAL: &str = "GPGImport";
/// Fields requested for package listings.
const PACKAGE_FIELDS: [&str; 3] = ["summary", "size", "action"];
/// Signals buffered between two runs.
const MAX_QUEUED_SIGNALS: usize = 32;

impl From<zbus::Error> for BackendFault {
    fn from(err: zbus::Error) -> Self {
        match err {
            zbus::Error::MethodError(name, description, _) => Self::Remote {
                name: name.to_string(),
                message: description.unwrap_or_default(),
            },
            other => Self::from_transport_text(&other.to_string()),
        }
    }
}

/// Body of the `GPGImport` signal.
type GpgSignalBody = (String, String, String, String, i64);

/// What: Blocking client for the DNF system daemon.
///
/// Inputs:
/// - Connects to the system bus on construction.
///
/// Output:
/// - Implements [`Backend`]; every call blocks until the daemon replies.
///
/// Details:
/// - Subscribes to `GPGImport` at construction so the signal emitted during
///   `RunTransaction` is buffered and can be read once the call returns.
pub struct DnfSystemClient {
    /// Blocking bus connection.
    conn: zbus::blocking::Connection,
    /// Buffered key-confirmation signals.
    gpg_signals: Mutex<Pin<Box<zbus::MessageStream>>>,
}

impl DnfSystemClient {
    /// What: Connect to the system bus and subscribe to key-confirmation signals.
    ///
    /// Output:
    /// - Ready client (the daemon is bus-activated on first call).
    ///
    /// # Errors
    /// - [`BackendFault`] when the bus is unreachable or the match rule is rejected.
    pub fn connect() -> Result<Self, BackendFault> {
        let conn = zbus::blocking::Connection::system()?;
        let rule = zbus::MatchRule::builder()
            .msg_type(zbus::message::Type::Signal)
            .interface(INTERFACE)?
            .member(GPG_SIGNAL)?
            .build();
        let stream = futures::executor::block_on(zbus::MessageStream::for_match_rule(
            rule,
            conn.inner(),
            Some(MAX_QUEUED_SIGNALS),
        ))?;
        tracing::debug!("[Backend] connected to {DESTINATION}");
        Ok(Self {
            conn,
            gpg_signals: Mutex::new(Box::pin(stream)),
        })
    }

    /// Invoke `method`, ignoring whatever the reply carries.
    fn invoke<B>(&self, method: &'static str, body: &B) -> Result<zbus::Message, BackendFault>
    where
        B: Serialize + DynamicType,
    {
        tracing::trace!(method, "[Backend] call");
        Ok(self
            .conn
            .call_method(Some(DESTINATION), OBJECT_PATH, Some(INTERFACE), method, body)?)
    }

    /// Invoke `method` and deserialize its reply body.
    fn call<B, R>(&self, method: &'static str, body: &B) -> Result<R, BackendFault>
    where
        B: Serialize + DynamicType,
        R: for<'d> DynamicDeserialize<'d>,
    {
        self.invoke(method, body)?
            .body()
            .deserialize::<R>()
            .map_err(|e| BackendFault::Malformed {
                call: method,
                detail: e.to_string(),
            })
    }

    /// Invoke a method that answers with a JSON string.
    fn call_json<B>(&self, method: &'static str, body: &B) -> Result<String, BackendFault>
    where
        B: Serialize + DynamicType,
    {
        self.call::<B, String>(method, body)
    }
}

impl Backend for DnfSystemClient {
    fn lock(&self) -> Result<LockReply, BackendFault> {
        match self.call::<_, bool>("Lock", &()) {
            Ok(true) => Ok(LockReply::Granted),
            Ok(false) => Ok(LockReply::Denied {
                reason: LOCK_REASON_LOCKED_BY_OTHER.to_string(),
            }),
            Err(fault) => match fault.short_name() {
                "AccessDeniedError" => Ok(LockReply::Denied {
                    reason: LOCK_REASON_NOT_AUTHORIZED.to_string(),
                }),
                "LockedError" => Ok(LockReply::Denied {
                    reason: LOCK_REASON_LOCKED_BY_OTHER.to_string(),
                }),
                _ => Err(fault),
            },
        }
    }

    fn unlock(&self) -> Result<(), BackendFault> {
        self.invoke("Unlock", &()).map(|_| ())
    }

    fn exit(&self) -> Result<(), BackendFault> {
        self.invoke("Exit", &()).map(|_| ())
    }

    fn expire_cache(&self) -> Result<bool, BackendFault> {
        self.call("ExpireCache", &())
    }

    fn clear_transaction(&self) -> Result<(), BackendFault> {
        self.invoke("ClearTransaction", &()).map(|_| ())
    }

    fn add_to_transaction(&self, item: &TransactionItem) -> Result<bool, BackendFault> {
        match item {
            TransactionItem::Package { pkg, action } => {
                let raw = self.call_json(
                    "AddTransaction",
                    &(pkg.as_str(), action.as_backend_str()),
                )?;
                wire::add_reply("AddTransaction", &raw)
            }
            TransactionItem::Group { id, action } => {
                let method = match action {
                    GroupAction::Install => "GroupInstall",
                    GroupAction::Remove => "GroupRemove",
                };
                let raw = self.call_json(method, &(id.as_str(),))?;
                wire::add_reply(method, &raw)
            }
        }
    }

    fn resolve_transaction(&self) -> Result<Resolution, BackendFault> {
        let raw = self.call_json("BuildTransaction", &())?;
        wire::resolution("BuildTransaction", &raw)
    }

    fn get_transaction(&self) -> Result<Resolution, BackendFault> {
        let raw = self.call_json("GetTransaction", &())?;
        wire::resolution("GetTransaction", &raw)
    }

    fn run_transaction(&self) -> Result<RunReply, BackendFault> {
        let raw = self.call_json("RunTransaction", &())?;
        wire::run_reply(&raw)
    }

    fn confirm_signing_key(&self, key_id: &str, trusted: bool) -> Result<(), BackendFault> {
        self.invoke("ConfirmGPGImport", &(key_id, trusted))
            .map(|_| ())
    }

    fn pending_key_confirmation(&self) -> Result<Option<GpgConfirmation>, BackendFault> {
        let mut stream = self
            .gpg_signals
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut latest = None;
        // Only drain what is already buffered; never wait for a new signal.
        while let Some(Some(msg)) = stream.next().now_or_never() {
            let msg = msg?;
            let (pkg_id, user_id, key_id, key_url, timestamp): GpgSignalBody =
                msg.body().deserialize().map_err(|e| BackendFault::Malformed {
                    call: GPG_SIGNAL,
                    detail: e.to_string(),
                })?;
            latest = Some(GpgConfirmation {
                package: PackageId::new(pkg_id),
                user_id,
                key_id,
                key_url,
                timestamp,
            });
        }
        Ok(latest)
    }

    fn list_packages(&self, filter: PackageFilter) -> Result<Vec<PackageInfo>, BackendFault> {
        let fields: Vec<&str> = PACKAGE_FIELDS.to_vec();
        let raw = self.call_json("GetPackages", &(filter.as_wire(), fields))?;
        wire::packages("GetPackages", &raw)
    }

    fn search_by_name(
        &self,
        pattern: &str,
        newest_only: bool,
    ) -> Result<Vec<PackageInfo>, BackendFault> {
        let raw = self.call_json("GetPackagesByName", &(pattern, newest_only))?;
        wire::packages("GetPackagesByName", &raw)
    }

    fn list_groups(&self) -> Result<Vec<GroupCategory>, BackendFault> {
        let raw = self.call_json("GetGroups", &())?;
        wire::groups(&raw)
    }

    fn history(&self, start_days: u32, end_days: u32) -> Result<Vec<HistoryEntry>, BackendFault> {
        let start = i32::try_from(start_days).unwrap_or(i32::MAX);
        let end = i32::try_from(end_days).unwrap_or(i32::MAX);
        let raw = self.call_json("GetHistoryByDays", &(start, end))?;
        wire::history(&raw)
    }

    fn undo_history(&self, id: i64) -> Result<UndoReply, BackendFault> {
        let tid = i32::try_from(id).map_err(|_| BackendFault::Malformed {
            call: "HistoryUndo",
            detail: format!("history id {id} out of range"),
        })?;
        let raw = self.call_json("HistoryUndo", &(tid,))?;
        wire::undo_reply(&raw)
    }
}
