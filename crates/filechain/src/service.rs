//! Append service: the boundary between a request and the ledger.
//!
//! Checks that every field is present, hands the transfer to the ledger and
//! reports the outcome with a status code. Transport is left to the caller.

use std::sync::Arc;

use filechain_core::{BlockHash, FileSize, TransferRecord, ValidationError};
use filechain_store::{RecordStore, SnapshotStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ErrorKind;
use crate::ledger::Ledger;

/// A file size as it arrives on the wire: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileSizeInput {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

impl TryFrom<FileSizeInput> for FileSize {
    type Error = ValidationError;

    fn try_from(input: FileSizeInput) -> Result<Self, Self::Error> {
        match input {
            FileSizeInput::Unsigned(n) => FileSize::try_from(n),
            FileSizeInput::Signed(n) => FileSize::try_from(n),
            FileSizeInput::Text(s) => FileSize::try_from(s),
        }
    }
}

/// An append request. Every field is required; absence is reported, not
/// defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendRequest {
    pub file_name: Option<String>,
    pub file_size: Option<FileSizeInput>,
    pub sender_name: Option<String>,
    pub receiver_name: Option<String>,
}

impl AppendRequest {
    pub fn new(
        file_name: impl Into<String>,
        sender_name: impl Into<String>,
        receiver_name: impl Into<String>,
        file_size: FileSizeInput,
    ) -> Self {
        Self {
            file_name: Some(file_name.into()),
            file_size: Some(file_size),
            sender_name: Some(sender_name.into()),
            receiver_name: Some(receiver_name.into()),
        }
    }

    /// The first absent field, checked in request order.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.file_name.is_none() {
            Some("file_name")
        } else if self.file_size.is_none() {
            Some("file_size")
        } else if self.sender_name.is_none() {
            Some("sender_name")
        } else if self.receiver_name.is_none() {
            Some("receiver_name")
        } else {
            None
        }
    }
}

/// Outcome of an append request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AppendResponse {
    /// A required field was absent.
    MissingField { field: &'static str },
    /// The request was malformed or a value failed validation.
    Invalid { reason: String },
    /// The block was appended.
    Appended { hash: BlockHash, height: u64 },
    /// The ledger refused or failed the append.
    Rejected { kind: ErrorKind, reason: String },
}

impl AppendResponse {
    /// HTTP-style status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            AppendResponse::MissingField { .. } => 404,
            AppendResponse::Invalid { .. } => 400,
            AppendResponse::Appended { .. } => 200,
            AppendResponse::Rejected {
                kind: ErrorKind::Concurrency,
                ..
            } => 409,
            AppendResponse::Rejected { .. } => 500,
        }
    }

    /// Response body. A missing field is reported as `{"<field>Found": "false"}`.
    pub fn body(&self) -> Value {
        match self {
            AppendResponse::MissingField { field } => {
                let mut body = Map::new();
                body.insert(format!("{field}Found"), Value::from("false"));
                Value::Object(body)
            }
            other => serde_json::to_value(other).unwrap_or(Value::Null),
        }
    }
}

/// Boundary adapter in front of a [`Ledger`].
pub struct AppendService<R: RecordStore, P: SnapshotStore> {
    ledger: Arc<Ledger<R, P>>,
}

impl<R: RecordStore, P: SnapshotStore> Clone for AppendService<R, P> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<R: RecordStore, P: SnapshotStore> AppendService<R, P> {
    pub fn new(ledger: Arc<Ledger<R, P>>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<Ledger<R, P>> {
        &self.ledger
    }

    /// Handle a decoded request.
    pub async fn handle(&self, request: AppendRequest) -> AppendResponse {
        if let Some(field) = request.missing_field() {
            tracing::debug!(field, "append request missing field");
            return AppendResponse::MissingField { field };
        }

        let AppendRequest {
            file_name: Some(file_name),
            file_size: Some(file_size),
            sender_name: Some(sender_name),
            receiver_name: Some(receiver_name),
        } = request
        else {
            return AppendResponse::Invalid {
                reason: "incomplete request".into(),
            };
        };

        let record = match TransferRecord::try_new(file_name, sender_name, receiver_name, file_size)
        {
            Ok(record) => record,
            Err(err) => {
                return AppendResponse::Invalid {
                    reason: err.to_string(),
                }
            }
        };

        match self.ledger.append(record).await {
            Ok(block) => AppendResponse::Appended {
                hash: *block.hash(),
                height: block.index().0,
            },
            Err(err) => {
                tracing::warn!(error = %err, kind = ?err.kind(), "append rejected");
                AppendResponse::Rejected {
                    kind: err.kind(),
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Handle a JSON request body.
    pub async fn handle_json(&self, body: &str) -> AppendResponse {
        match serde_json::from_str::<AppendRequest>(body) {
            Ok(request) => self.handle(request).await,
            Err(err) => AppendResponse::Invalid {
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppendPolicy, LedgerConfig};
    use filechain_store::MemoryStore;
    use serde_json::json;

    async fn service(policy: AppendPolicy) -> AppendService<MemoryStore, MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::initialize(
            store.clone(),
            store,
            LedgerConfig::default().with_append_policy(policy),
        )
        .await
        .unwrap();
        AppendService::new(Arc::new(ledger))
    }

    #[tokio::test]
    async fn test_appended() {
        let svc = service(AppendPolicy::Queue).await;
        let response = svc
            .handle_json(
                r#"{"file_name":"report.pdf","file_size":"2048","sender_name":"alice","receiver_name":"bob"}"#,
            )
            .await;

        assert_eq!(response.status_code(), 200);
        match response {
            AppendResponse::Appended { hash, height } => {
                assert_eq!(height, 1);
                assert_eq!(&hash, svc.ledger().tip().await.hash());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_numeric_file_size() {
        let svc = service(AppendPolicy::Queue).await;
        let response = svc
            .handle_json(
                r#"{"file_name":"a","file_size":10,"sender_name":"b","receiver_name":"c"}"#,
            )
            .await;
        assert_eq!(response.status_code(), 200);
    }

    #[tokio::test]
    async fn test_missing_field_is_404() {
        let svc = service(AppendPolicy::Queue).await;
        let response = svc
            .handle_json(r#"{"file_name":"a","sender_name":"b","receiver_name":"c"}"#)
            .await;

        assert_eq!(response, AppendResponse::MissingField { field: "file_size" });
        assert_eq!(response.status_code(), 404);
        assert_eq!(response.body(), json!({ "file_sizeFound": "false" }));
        assert_eq!(svc.ledger().len().await, 1);
    }

    #[tokio::test]
    async fn test_bad_file_size_is_400() {
        let svc = service(AppendPolicy::Queue).await;
        for body in [
            r#"{"file_name":"a","file_size":"ten","sender_name":"b","receiver_name":"c"}"#,
            r#"{"file_name":"a","file_size":-1,"sender_name":"b","receiver_name":"c"}"#,
            r#"{"file_name":"a","file_size":"","sender_name":"b","receiver_name":"c"}"#,
            r#"not json"#,
        ] {
            let response = svc.handle_json(body).await;
            assert_eq!(response.status_code(), 400, "{body}");
        }
        assert_eq!(svc.ledger().len().await, 1);
    }

    #[tokio::test]
    async fn test_storage_failure_is_500() {
        let svc = service(AppendPolicy::Queue).await;
        let response = svc
            .handle(AppendRequest::new("a", "b", "c", FileSizeInput::Unsigned(u64::MAX)))
            .await;

        assert_eq!(response.status_code(), 500);
        assert!(matches!(
            response,
            AppendResponse::Rejected {
                kind: ErrorKind::Integrity,
                ..
            }
        ));
    }

    #[test]
    fn test_rejected_concurrency_is_409() {
        let response = AppendResponse::Rejected {
            kind: ErrorKind::Concurrency,
            reason: "busy".into(),
        };
        assert_eq!(response.status_code(), 409);
        assert_eq!(response.body()["kind"], "concurrency");
    }
}
