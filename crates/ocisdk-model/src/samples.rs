//! A handful of concrete models.
//!
//! These cover the shapes the engines care about: a plain resource with an
//! open enum and tag maps (`Alarm`), a list response that carries its page
//! token in the body (`ListObjects`), and a pollable work request
//! (`WorkRequest`).

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::TypeDescriptor as T;
use crate::model::WireModel;
use crate::open_enum;
use crate::schema::{FieldSchema, ModelRegistry, ModelSchema};

open_enum! {
    /// Lifecycle state of an alarm.
    pub enum AlarmLifecycleState {
        /// In use.
        Active => "ACTIVE",
        /// Being deleted.
        Deleting => "DELETING",
        /// Gone.
        Deleted => "DELETED",
    }
}

open_enum! {
    /// Status of an asynchronous work request.
    pub enum WorkRequestStatus {
        /// Queued.
        Accepted => "ACCEPTED",
        /// Running.
        InProgress => "IN_PROGRESS",
        /// Finished with an error.
        Failed => "FAILED",
        /// Finished successfully.
        Succeeded => "SUCCEEDED",
        /// Cancellation in progress.
        Canceling => "CANCELING",
        /// Cancelled.
        Canceled => "CANCELED",
    }
}

impl WorkRequestStatus {
    /// Whether the work request will not change state again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Succeeded | Self::Canceled)
    }
}

fn tag_maps() -> [FieldSchema; 2] {
    [
        FieldSchema::new("freeform_tags", "freeformTags", T::map(T::String)),
        FieldSchema::new("defined_tags", "definedTags", T::map(T::map(T::Object))),
    ]
}

/// A monitoring alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    /// OCID of the alarm.
    pub id: String,
    /// User-facing name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Compartment holding the alarm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    /// Metric namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Monitoring query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Severity label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Whether notifications are sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    /// Lifecycle state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<AlarmLifecycleState>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeform_tags: Option<HashMap<String, String>>,
    /// Namespaced tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defined_tags: Option<HashMap<String, HashMap<String, Value>>>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
}

static ALARM_SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
    let mut fields = vec![
        FieldSchema::new("id", "id", T::String),
        FieldSchema::new("display_name", "displayName", T::String),
        FieldSchema::new("compartment_id", "compartmentId", T::String),
        FieldSchema::new("namespace", "namespace", T::String),
        FieldSchema::new("query", "query", T::String),
        FieldSchema::new("severity", "severity", T::String),
        FieldSchema::new("is_enabled", "isEnabled", T::Boolean),
        FieldSchema::new("lifecycle_state", "lifecycleState", T::String),
        FieldSchema::new("time_created", "timeCreated", T::DateTime),
    ];
    fields.extend(tag_maps());
    ModelSchema::new("Alarm", fields)
});

impl WireModel for Alarm {
    fn schema() -> &'static ModelSchema {
        &ALARM_SCHEMA
    }
}

/// One entry of an object listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Object name.
    pub name: String,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Base64 MD5 of the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    /// Entity tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_created: Option<DateTime<Utc>>,
}

static OBJECT_SUMMARY_SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
    ModelSchema::new(
        "ObjectSummary",
        vec![
            FieldSchema::new("name", "name", T::String),
            FieldSchema::new("size", "size", T::Integer),
            FieldSchema::new("md5", "md5", T::String),
            FieldSchema::new("etag", "etag", T::String),
            FieldSchema::new("time_created", "timeCreated", T::DateTime),
        ],
    )
});

impl WireModel for ObjectSummary {
    fn schema() -> &'static ModelSchema {
        &OBJECT_SUMMARY_SCHEMA
    }
}

/// An object listing. The next page token travels in `nextStartWith`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObjects {
    /// Objects in this page.
    #[serde(default)]
    pub objects: Vec<ObjectSummary>,
    /// Common prefixes when listing with a delimiter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefixes: Option<Vec<String>>,
    /// Name to start the next page with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_start_with: Option<String>,
}

static LIST_OBJECTS_SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
    ModelSchema::new(
        "ListObjects",
        vec![
            FieldSchema::new("objects", "objects", T::array(T::model("ObjectSummary"))),
            FieldSchema::new("prefixes", "prefixes", T::array(T::String)),
            FieldSchema::new("next_start_with", "nextStartWith", T::String),
        ],
    )
    .with_next_page_field("nextStartWith")
});

impl WireModel for ListObjects {
    fn schema() -> &'static ModelSchema {
        &LIST_OBJECTS_SCHEMA
    }
}

/// An asynchronous operation tracked by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRequest {
    /// OCID of the work request.
    pub id: String,
    /// What kind of operation is being performed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    /// Current status.
    pub status: WorkRequestStatus,
    /// Compartment of the affected resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment_id: Option<String>,
    /// Progress in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<f32>,
    /// When the request was accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_accepted: Option<DateTime<Utc>>,
    /// When the request finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_finished: Option<DateTime<Utc>>,
}

static WORK_REQUEST_SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
    ModelSchema::new(
        "WorkRequest",
        vec![
            FieldSchema::new("id", "id", T::String),
            FieldSchema::new("operation_type", "operationType", T::String),
            FieldSchema::new("status", "status", T::String),
            FieldSchema::new("compartment_id", "compartmentId", T::String),
            FieldSchema::new("percent_complete", "percentComplete", T::Float),
            FieldSchema::new("time_accepted", "timeAccepted", T::DateTime),
            FieldSchema::new("time_finished", "timeFinished", T::DateTime),
        ],
    )
});

impl WireModel for WorkRequest {
    fn schema() -> &'static ModelSchema {
        &WORK_REQUEST_SCHEMA
    }
}

/// A registry holding every model in this module.
#[must_use]
pub fn sample_registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry
        .register_model::<Alarm>()
        .register_model::<ObjectSummary>()
        .register_model::<ListObjects>()
        .register_model::<WorkRequest>();
    registry
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    fn round_trip<M: WireModel + PartialEq + std::fmt::Debug>(model: &M) {
        let registry = sample_registry();
        let wire = model.to_wire().unwrap();
        let back = M::from_wire(wire, &registry).unwrap();
        assert_eq!(&back, model);
    }

    #[test]
    fn test_should_round_trip_every_sample_model() {
        round_trip(&Alarm {
            id: "ocid1.alarm.oc1..a".to_owned(),
            display_name: Some("cpu".to_owned()),
            compartment_id: Some("ocid1.compartment.oc1..c".to_owned()),
            namespace: Some("oci_computeagent".to_owned()),
            query: Some("CpuUtilization[1m].mean() > 90".to_owned()),
            severity: Some("CRITICAL".to_owned()),
            is_enabled: Some(true),
            lifecycle_state: Some(AlarmLifecycleState::Unknown("ARCHIVED".to_owned())),
            freeform_tags: Some(HashMap::from([("team".to_owned(), "infra".to_owned())])),
            defined_tags: Some(HashMap::from([(
                "Ops".to_owned(),
                HashMap::from([("CostCenter".to_owned(), json!(42))]),
            )])),
            time_created: Some(time()),
        });

        let summary = ObjectSummary {
            name: "a.txt".to_owned(),
            size: Some(12),
            md5: None,
            etag: Some("e1".to_owned()),
            time_created: Some(time()),
        };
        round_trip(&summary);

        round_trip(&ListObjects {
            objects: vec![summary],
            prefixes: Some(vec!["logs/".to_owned()]),
            next_start_with: Some("b.txt".to_owned()),
        });

        round_trip(&WorkRequest {
            id: "ocid1.workrequest.oc1..w".to_owned(),
            operation_type: Some("CREATE_VCN".to_owned()),
            status: WorkRequestStatus::InProgress,
            compartment_id: None,
            percent_complete: Some(50.0),
            time_accepted: Some(time()),
            time_finished: None,
        });
    }

    #[test]
    fn test_should_preserve_unknown_enum_values() {
        let state: AlarmLifecycleState = serde_json::from_value(json!("SUSPENDED")).unwrap();
        assert!(state.is_unknown());
        assert_eq!(serde_json::to_value(&state).unwrap(), json!("SUSPENDED"));
    }

    #[test]
    fn test_should_classify_terminal_work_request_states() {
        assert!(WorkRequestStatus::Succeeded.is_terminal());
        assert!(WorkRequestStatus::Canceled.is_terminal());
        assert!(!WorkRequestStatus::Canceling.is_terminal());
        assert!(!WorkRequestStatus::Unknown("PAUSED".to_owned()).is_terminal());
    }

    #[test]
    fn test_should_declare_body_pagination_field() {
        assert_eq!(ListObjects::schema().next_page_field, Some("nextStartWith"));
        assert_eq!(Alarm::schema().next_page_field, None);
    }
}
