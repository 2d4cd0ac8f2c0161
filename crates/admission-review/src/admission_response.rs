use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::EncodeError;

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/api/admission/v1#AdmissionResponse
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// The type of Patch. Currently we only allow "JSONPatch".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// The patch body, base64 encoded. Only "JSONPatch" (RFC 6902) is supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Human readable details about the decision. Kubernetes only shows it
    /// to the user when the request is denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_annotations: Option<HashMap<String, String>>,

    /// Warning messages returned to the requesting API client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// PatchType is the type of patch being used to represent the mutated object
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

/// Values that Status.Status of an AdmissionResponse can have
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub enum AdmissionResponseStatusValue {
    Success,
    Failure,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    /// One of: "Success" or "Failure".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatusValue>,

    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Suggested HTTP return code for this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl AdmissionResponse {
    /// An accepting verdict. The uid is left empty: it is stamped by the
    /// component that answers the AdmissionReview.
    pub fn allow(message: impl Into<String>) -> AdmissionResponse {
        AdmissionResponse {
            allowed: true,
            status: Some(AdmissionResponseStatus {
                status: Some(AdmissionResponseStatusValue::Success),
                message: Some(message.into()),
                code: None,
            }),
            ..Default::default()
        }
    }

    /// A rejecting verdict, see [`AdmissionResponse::allow`] about the uid.
    pub fn deny(message: impl Into<String>) -> AdmissionResponse {
        AdmissionResponse {
            allowed: false,
            status: Some(AdmissionResponseStatus {
                status: Some(AdmissionResponseStatusValue::Failure),
                message: Some(message.into()),
                code: None,
            }),
            ..Default::default()
        }
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> AdmissionResponse {
        self.uid = uid.into();
        self
    }

    /// Attach a RFC 6902 JSON patch to the response.
    pub fn with_json_patch(mut self, patch: &serde_json::Value) -> Result<Self, EncodeError> {
        let raw = serde_json::to_string(patch).map_err(EncodeError::Serialize)?;
        self.patch = Some(general_purpose::STANDARD.encode(raw));
        self.patch_type = Some(PatchType::JSONPatch);
        Ok(self)
    }

    pub fn message(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.message.as_deref())
    }
}
