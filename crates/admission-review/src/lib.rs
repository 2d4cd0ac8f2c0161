pub mod admission_request;
pub mod admission_response;
pub mod admission_review;
pub mod errors;
pub mod group_version;
pub mod scheme;

pub use admission_request::AdmissionRequest;
pub use admission_response::{AdmissionResponse, AdmissionResponseStatus};
pub use admission_review::{AdmissionReview, encode};
pub use errors::{DecodeError, EncodeError};
pub use group_version::{GroupVersionKind, GroupVersionResource};
pub use scheme::{Decoded, Registered, Scheme};
