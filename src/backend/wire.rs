//! JSON reply decoding.
//!
//! The daemon answers most calls with a JSON document packed into a D-Bus
//! string. These helpers turn those documents into typed values, reporting
//! anything unexpected as [`BackendFault::Malformed`].

use serde::de::DeserializeOwned;

use super::fault::BackendFault;
use super::types::{
    GroupCategory, GroupInfo, HistoryEntry, PackageId, PackageInfo, PlanEntry, PlanOperation,
    TransactionPlan,
};
use super::{Resolution, RunReply, UndoReply};

/// Plan section on the wire: `[kind, [[pkg_id, size, [replaces]], ...]]`.
type WirePlanSection = (String, Vec<(String, serde_json::Value, Vec<String>)>);
/// Group tree on the wire: `[[[cat_id, name, desc], [[grp_id, name, desc, installed], ...]], ...]`.
type WireGroupTree = Vec<((String, String, String), Vec<(String, String, String, bool)>)>;

/// Decode a JSON document into `T`, naming `call` in the error.
fn decode<T: DeserializeOwned>(call: &'static str, raw: &str) -> Result<T, BackendFault> {
    serde_json::from_str(raw).map_err(|e| BackendFault::Malformed {
        call,
        detail: e.to_string(),
    })
}

/// Sizes come as integers or floats depending on the daemon version.
fn size_of(value: &serde_json::Value) -> u64 {
    value
        .as_u64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let v = f as u64;
                    v
                })
        })
        .unwrap_or(0)
}

/// What: Flatten the daemon's sectioned plan into ordered entries.
///
/// Inputs:
/// - `value`: JSON plan `[[kind, [[pkg_id, size, [replaces]], ...]], ...]`.
///
/// Output:
/// - [`TransactionPlan`] in daemon order.
///
/// # Errors
/// - [`BackendFault::Malformed`] when the shape does not match.
pub fn plan_from_value(
    call: &'static str,
    value: serde_json::Value,
) -> Result<TransactionPlan, BackendFault> {
    let sections: Vec<WirePlanSection> =
        serde_json::from_value(value).map_err(|e| BackendFault::Malformed {
            call,
            detail: e.to_string(),
        })?;
    let entries = sections
        .into_iter()
        .flat_map(|(kind, items)| {
            let operation = PlanOperation::from_wire(&kind);
            items.into_iter().map(move |(id, size, replaces)| PlanEntry {
                operation: operation.clone(),
                package: PackageId::new(id),
                size: size_of(&size),
                replaces: replaces.into_iter().map(PackageId::new).collect(),
            })
        })
        .collect();
    Ok(TransactionPlan { entries })
}

/// Messages arrive as a list of strings, or occasionally a single string.
fn messages_from_value(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        serde_json::Value::String(s) => vec![s],
        serde_json::Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

/// Decode `[ok, plan-delta]` from `AddTransaction`/`GroupInstall`/`GroupRemove`.
///
/// # Errors
/// - [`BackendFault::Malformed`] on unexpected shape.
pub fn add_reply(call: &'static str, raw: &str) -> Result<bool, BackendFault> {
    let (ok, _delta): (bool, serde_json::Value) = decode(call, raw)?;
    Ok(ok)
}

/// Decode `[ok, plan | messages]` from `BuildTransaction`/`GetTransaction`.
///
/// # Errors
/// - [`BackendFault::Malformed`] on unexpected shape.
pub fn resolution(call: &'static str, raw: &str) -> Result<Resolution, BackendFault> {
    let (ok, payload): (bool, serde_json::Value) = decode(call, raw)?;
    if ok {
        Ok(Resolution::Resolved(plan_from_value(call, payload)?))
    } else {
        Ok(Resolution::Unresolved(messages_from_value(payload)))
    }
}

/// Decode `[status, messages]` from `RunTransaction`.
///
/// # Errors
/// - [`BackendFault::Malformed`] on unexpected shape.
pub fn run_reply(raw: &str) -> Result<RunReply, BackendFault> {
    let (status, payload): (i32, serde_json::Value) = decode("RunTransaction", raw)?;
    Ok(RunReply {
        status,
        messages: messages_from_value(payload),
    })
}

/// Decode `[ok, messages]` from `HistoryUndo`.
///
/// # Errors
/// - [`BackendFault::Malformed`] on unexpected shape.
pub fn undo_reply(raw: &str) -> Result<UndoReply, BackendFault> {
    let (ok, payload): (bool, serde_json::Value) = decode("HistoryUndo", raw)?;
    Ok(UndoReply {
        ok,
        messages: messages_from_value(payload),
    })
}

/// Decode `[[pkg_id, summary, size, action], ...]` from package listings.
///
/// # Errors
/// - [`BackendFault::Malformed`] on unexpected shape.
pub fn packages(call: &'static str, raw: &str) -> Result<Vec<PackageInfo>, BackendFault> {
    let rows: Vec<(String, String, serde_json::Value, String)> = decode(call, raw)?;
    Ok(rows
        .into_iter()
        .map(|(id, summary, size, action)| PackageInfo {
            id: PackageId::new(id),
            summary,
            size: size_of(&size),
            action,
        })
        .collect())
}

/// Decode the category/group tree from `GetGroups`.
///
/// # Errors
/// - [`BackendFault::Malformed`] on unexpected shape.
pub fn groups(raw: &str) -> Result<Vec<GroupCategory>, BackendFault> {
    let tree: WireGroupTree = decode("GetGroups", raw)?;
    Ok(tree
        .into_iter()
        .map(|((id, name, description), groups)| GroupCategory {
            id,
            name,
            description,
            groups: groups
                .into_iter()
                .map(|(id, name, description, installed)| GroupInfo {
                    id,
                    name,
                    description,
                    installed,
                })
                .collect(),
        })
        .collect())
}

/// Decode `[[tid, date], ...]` from `GetHistoryByDays`.
///
/// # Errors
/// - [`BackendFault::Malformed`] on unexpected shape.
pub fn history(raw: &str) -> Result<Vec<HistoryEntry>, BackendFault> {
    let rows: Vec<(i64, String)> = decode("GetHistoryByDays", raw)?;
    Ok(rows
        .into_iter()
        .map(|(id, date)| HistoryEntry { id, date })
        .collect())
}
