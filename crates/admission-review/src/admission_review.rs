use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;
use crate::errors::EncodeError;
use crate::group_version::GroupVersionKind;

pub const ADMISSION_GROUP: &str = "admission.k8s.io";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// The envelope exchanged with the API server. A review sent by Kubernetes
/// carries a `request`, the answer carries a `response`.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    /// Build the envelope answering a review that was received as `gvk`.
    /// The API server expects the answer to use the same schema version it sent.
    pub fn response_for(gvk: &GroupVersionKind, response: AdmissionResponse) -> Self {
        AdmissionReview {
            api_version: gvk.api_version(),
            kind: gvk.kind.clone(),
            request: None,
            response: Some(response),
        }
    }

    pub fn group_version_kind(&self) -> GroupVersionKind {
        GroupVersionKind::from_api_version(&self.api_version, &self.kind)
    }
}

pub fn encode(review: &AdmissionReview) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(review).map_err(EncodeError::Serialize)
}
