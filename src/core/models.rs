//! Data passed between the decoder, the backend client and the encoder

use serde::{Deserialize, Serialize};

use super::RelayError;

/// Time window of a free/busy lookup. Values are kept exactly as the
/// client sent them so they can be forwarded to the backend untouched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

/// A free/busy lookup for one or more mailboxes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AvailabilityQuery {
    accounts: Vec<String>,
    window: TimeWindow,
    merge_interval_minutes: String,
}

impl AvailabilityQuery {
    pub fn new(
        accounts: Vec<String>,
        window: TimeWindow,
        merge_interval_minutes: String,
    ) -> Result<Self, RelayError> {
        if accounts.is_empty() {
            return Err(RelayError::MalformedRequest(
                "at least one mailbox is required".to_string(),
            ));
        }
        Ok(Self {
            accounts,
            window,
            merge_interval_minutes,
        })
    }

    pub fn accounts(&self) -> &[String] {
        &self.accounts
    }

    /// The backend scopes its endpoint to a single user, the first one asked for
    pub fn first_account(&self) -> &str {
        // `new` rejects an empty account list
        &self.accounts[0]
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn merge_interval_minutes(&self) -> &str {
        &self.merge_interval_minutes
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FreeBusyStatus {
    Free,
    Tentative,
    Busy,
    #[serde(rename = "oof", alias = "outOfOffice")]
    OutOfOffice,
    WorkingElsewhere,
    #[default]
    #[serde(other)]
    Unknown,
}

impl FreeBusyStatus {
    pub fn is_free(&self) -> bool {
        matches!(self, FreeBusyStatus::Free)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleItem {
    pub status: FreeBusyStatus,
    pub start: String,
    pub end: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccountSchedule {
    pub schedule_id: Option<String>,
    pub items: Vec<ScheduleItem>,
}

/// Schedules in the order the backend returned them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BackendScheduleResult {
    pub schedules: Vec<AccountSchedule>,
}
