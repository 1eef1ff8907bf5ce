// Access layer: typed issue and user-profile operations on top of the
// generic insert/select calls of a `RemoteService`.
//
// The binary only creates profiles (during sign-up). `fetch_user_profile`
// and `list_user_profiles` are library API for other callers of this crate
// and have no screen of their own.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{Filter, RemoteService};
use crate::error::{Error, Result};

pub const ISSUES_TABLE: &str = "issues";
pub const USERS_TABLE: &str = "users";
pub const DEFAULT_STATUS: &str = "open";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    /// Stored as null when the row was created without one.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub status: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
}

/// Insert payload for an issue. Always carries an owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    title: String,
    description: Option<String>,
    status: Option<String>,
    owner_id: String,
}

impl NewIssue {
    pub fn new(title: impl Into<String>, owner_id: impl Into<String>) -> Result<Self> {
        let owner_id = owner_id.into();
        if owner_id.trim().is_empty() {
            return Err(Error::MissingOwner);
        }
        Ok(NewIssue {
            title: title.into(),
            description: None,
            status: None,
            owner_id,
        })
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn row(&self) -> Value {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STATUS);
        json!({
            "title": self.title,
            "description": self.description.as_deref().unwrap_or(""),
            "status": status,
            "user_id": self.owner_id,
        })
    }
}

pub fn create_issue<S: RemoteService>(service: &S, issue: &NewIssue) -> Result<Issue> {
    let _span = tracing::info_span!("create_issue", owner = %issue.owner_id).entered();
    insert_one(service, ISSUES_TABLE, issue.row())
}

/// Every issue the current credentials can see. Row visibility is decided by
/// the service.
pub fn list_issues<S: RemoteService>(service: &S) -> Result<Vec<Issue>> {
    let rows = service.select(ISSUES_TABLE, None)?;
    tracing::debug!(count = rows.len(), "issues fetched");
    decode_rows(rows)
}

pub fn create_user_profile<S: RemoteService>(service: &S, name: &str) -> Result<UserProfile> {
    let _span = tracing::info_span!("create_user_profile").entered();
    insert_one(service, USERS_TABLE, json!({ "name": name }))
}

pub fn fetch_user_profile<S: RemoteService>(service: &S, id: i64) -> Result<UserProfile> {
    let rows = service.select(USERS_TABLE, Some(&Filter::eq("id", id)))?;
    decode_rows(rows)?
        .into_iter()
        .next()
        .ok_or(Error::NotFound {
            table: USERS_TABLE,
            id,
        })
}

pub fn list_user_profiles<S: RemoteService>(service: &S) -> Result<Vec<UserProfile>> {
    decode_rows(service.select(USERS_TABLE, None)?)
}

fn insert_one<S, T>(service: &S, table: &'static str, row: Value) -> Result<T>
where
    S: RemoteService,
    T: DeserializeOwned,
{
    let rows = service.insert(table, &Value::Array(vec![row]))?;
    let Some(first) = rows.into_iter().next() else {
        tracing::warn!(table, "insert returned no rows");
        return Err(Error::EmptyResult { table });
    };
    Ok(serde_json::from_value(first)?)
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Error::from))
        .collect()
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}


#[cfg(test)]
mod tests {
    use super::fake::FakeService;
    use super::*;
    use crate::error::Category;

    fn issue_row(id: i64, title: &str) -> Value {
        json!({
            "id": id,
            "title": title,
            "description": null,
            "status": "open",
            "user_id": "uid-a",
            "created_at": "2024-05-01T12:00:00Z",
        })
    }

    #[test]
    fn create_issue_defaults_status_to_open() {
        let service = FakeService::default();
        let new = NewIssue::new("Crash on save", "uid-a").unwrap().description("");

        let issue = create_issue(&service, &new).unwrap();

        assert_eq!(issue.title, "Crash on save");
        assert_eq!(issue.description, "");
        assert_eq!(issue.status, "open");
        assert_eq!(issue.user_id, "uid-a");
    }

    #[test]
    fn create_issue_keeps_explicit_status() {
        let service = FakeService::default();
        let new = NewIssue::new("Slow start", "uid-a")
            .unwrap()
            .description("takes 10s")
            .status("triage");

        let issue = create_issue(&service, &new).unwrap();
        assert_eq!(issue.status, "triage");
        assert_eq!(issue.description, "takes 10s");
    }

    #[test]
    fn new_issue_requires_owner() {
        assert!(matches!(NewIssue::new("t", " "), Err(Error::MissingOwner)));
    }

    #[test]
    fn hidden_echo_is_an_empty_result() {
        let service = FakeService::default();
        service.store.lock().unwrap().hide_inserts = true;
        let new = NewIssue::new("t", "uid-a").unwrap();

        let err = create_issue(&service, &new).unwrap_err();
        assert_eq!(err.category(), Category::EmptyResult);
        // the row still landed remotely
        assert_eq!(service.store.lock().unwrap().tables["issues"].len(), 1);
    }

    #[test]
    fn service_failure_is_classified_as_transport() {
        let service = FakeService::default();
        service.store.lock().unwrap().fail_tables = Some(503);

        let err = list_issues(&service).unwrap_err();
        assert_eq!(err.category(), Category::Transport);
        let err = create_issue(&service, &NewIssue::new("t", "uid-a").unwrap()).unwrap_err();
        assert_eq!(err.category(), Category::Transport);
    }

    #[test]
    fn list_issues_with_no_rows_is_empty_not_error() {
        let issues = list_issues(&FakeService::default()).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn list_issues_preserves_received_order_and_null_description() {
        let service = FakeService::default();
        service.seed(ISSUES_TABLE, vec![issue_row(9, "later"), issue_row(2, "earlier")]);

        let issues = list_issues(&service).unwrap();
        let ids: Vec<i64> = issues.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![9, 2]);
        assert_eq!(issues[0].description, "");
    }

    #[test]
    fn malformed_rows_are_decode_errors() {
        let service = FakeService::default();
        service.seed(ISSUES_TABLE, vec![json!({ "id": "not a number" })]);
        assert!(matches!(list_issues(&service), Err(Error::Decode(_))));
    }

    #[test]
    fn user_profiles_round_trip_through_the_service() {
        let service = FakeService::default();
        let ada = create_user_profile(&service, "Ada").unwrap();
        create_user_profile(&service, "Grace").unwrap();

        assert_eq!(fetch_user_profile(&service, ada.id).unwrap().name, "Ada");
        assert_eq!(list_user_profiles(&service).unwrap().len(), 2);
        assert!(matches!(
            fetch_user_profile(&service, 99),
            Err(Error::NotFound { table: USERS_TABLE, id: 99 })
        ));
    }
}
