//! Session bus client for the `dk.yumex.StatusIcon` presence service.

use serde::Serialize;
use zbus::zvariant::{DynamicDeserialize, DynamicType};

use super::{Notifier, ProcessRegistry};
use crate::backend::BackendFault;

/// Well-known bus name of the presence service.
const DESTINATION: &str = "dk.yumex.StatusIcon";
/// Object path of the presence service.
const OBJECT_PATH: &str = "/";
/// Interface of the presence service.
const INTERFACE: &str = "dk.yumex.StatusIcon";

/// Blocking client for the status-icon service.
pub struct StatusServiceClient {
    /// Blocking session bus connection.
    conn: zbus::blocking::Connection,
}

impl StatusServiceClient {
    /// What: Connect to the session bus.
    ///
    /// # Errors
    /// - [`BackendFault`] when the session bus is unreachable.
    pub fn connect() -> Result<Self, BackendFault> {
        let conn = zbus::blocking::Connection::session()?;
        tracing::debug!("[Presence] connected to {DESTINATION}");
        Ok(Self { conn })
    }

    /// Invoke `method` and deserialize its reply body.
    fn call<B, R>(&self, method: &'static str, body: &B) -> Result<R, BackendFault>
    where
        B: Serialize + DynamicType,
        R: for<'d> DynamicDeserialize<'d>,
    {
        tracing::trace!(method, "[Presence] call");
        self.conn
            .call_method(Some(DESTINATION), OBJECT_PATH, Some(INTERFACE), method, body)?
            .body()
            .deserialize::<R>()
            .map_err(|e| BackendFault::Malformed {
                call: method,
                detail: e.to_string(),
            })
    }

    /// Invoke `method`, ignoring the reply body.
    fn invoke<B>(&self, method: &'static str, body: &B) -> Result<(), BackendFault>
    where
        B: Serialize + DynamicType,
    {
        tracing::trace!(method, "[Presence] call");
        self.conn
            .call_method(Some(DESTINATION), OBJECT_PATH, Some(INTERFACE), method, body)?;
        Ok(())
    }
}

impl ProcessRegistry for StatusServiceClient {
    fn running_pid(&self) -> Result<i32, BackendFault> {
        self.call("GetYumexIsRunning", &())
    }

    fn set_running(&self, pid: i32, running: bool) -> Result<bool, BackendFault> {
        self.call("SetYumexIsRunning", &(pid, running))
    }

    fn is_working(&self) -> Result<bool, BackendFault> {
        self.call("GetYumexIsWorking", &())
    }
}

impl Notifier for StatusServiceClient {
    fn start(&self) -> Result<(), BackendFault> {
        self.invoke("Start", &())
    }

    fn exit(&self) -> Result<(), BackendFault> {
        self.invoke("Exit", &())
    }

    fn set_working(&self, working: bool) -> Result<(), BackendFault> {
        self.invoke("SetWorking", &(working,))
    }

    fn request_show(&self) -> Result<(), BackendFault> {
        self.invoke("ShowYumex", &())
    }

    fn request_quit(&self) -> Result<(), BackendFault> {
        self.invoke("QuitYumex", &())
    }

    fn set_update_count(&self, count: usize) -> Result<(), BackendFault> {
        let count = i32::try_from(count).unwrap_or(i32::MAX);
        self.invoke("SetUpdateCount", &(count,))
    }
}
