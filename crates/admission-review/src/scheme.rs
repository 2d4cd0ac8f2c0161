use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::admission_review::{ADMISSION_GROUP, ADMISSION_REVIEW_KIND, AdmissionReview};
use crate::errors::DecodeError;
use crate::group_version::GroupVersionKind;

/// A Rust type that can be decoded by a [`Scheme`] once registered.
pub trait Registered: DeserializeOwned {
    fn group_version_kind() -> GroupVersionKind;
}

/// The outcome of decoding a payload whose kind is read from the payload itself.
#[derive(Debug)]
pub enum Decoded {
    AdmissionReview(Box<AdmissionReview>),
    Object(serde_json::Value),
}

#[derive(Clone, Copy)]
enum RegisteredKind {
    AdmissionReview,
    Object(fn(&serde_json::Value) -> Result<(), serde_json::Error>),
}

/// Registry of the kinds this process knows how to decode.
///
/// A scheme is assembled once, before the server starts, and is read-only
/// afterwards: share it behind an `Arc` across request handlers.
#[derive(Clone)]
pub struct Scheme {
    kinds: HashMap<GroupVersionKind, RegisteredKind>,
}

impl Default for Scheme {
    /// A scheme that knows about the `admission.k8s.io` AdmissionReview kinds
    /// currently served by Kubernetes.
    fn default() -> Self {
        Scheme::new()
            .register_admission_review("v1")
            .register_admission_review("v1beta1")
    }
}

impl Scheme {
    /// An empty scheme, nothing can be decoded until kinds are registered.
    pub fn new() -> Self {
        Scheme {
            kinds: HashMap::new(),
        }
    }

    pub fn register_admission_review(mut self, version: &str) -> Self {
        self.kinds.insert(
            GroupVersionKind::new(ADMISSION_GROUP, version, ADMISSION_REVIEW_KIND),
            RegisteredKind::AdmissionReview,
        );
        self
    }

    pub fn register<T: Registered>(mut self) -> Self {
        self.kinds.insert(
            T::group_version_kind(),
            RegisteredKind::Object(check_shape::<T>),
        );
        self
    }

    pub fn is_registered(&self, gvk: &GroupVersionKind) -> bool {
        self.kinds.contains_key(gvk)
    }

    /// Decode a payload that describes its own type through `apiVersion` and `kind`.
    ///
    /// Returns the decoded object together with the group-version-kind read
    /// from the wire, which callers use to answer with the same schema.
    pub fn decode(&self, data: &[u8]) -> Result<(Decoded, GroupVersionKind), DecodeError> {
        let value: serde_json::Value =
            serde_json::from_slice(data).map_err(DecodeError::InvalidJson)?;
        let gvk = type_meta(&value)?;

        let registered = self
            .kinds
            .get(&gvk)
            .ok_or_else(|| DecodeError::NotRegistered(gvk.clone()))?;

        let decoded = match registered {
            RegisteredKind::AdmissionReview => {
                let review: AdmissionReview =
                    serde_json::from_value(value).map_err(|source| DecodeError::InvalidShape {
                        gvk: gvk.clone(),
                        source,
                    })?;
                Decoded::AdmissionReview(Box::new(review))
            }
            RegisteredKind::Object(check) => {
                check(&value).map_err(|source| DecodeError::InvalidShape {
                    gvk: gvk.clone(),
                    source,
                })?;
                Decoded::Object(value)
            }
        };

        Ok((decoded, gvk))
    }

    /// Decode raw bytes into the type the caller expects.
    pub fn decode_into<T: Registered>(&self, data: &[u8]) -> Result<T, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_slice(data).map_err(DecodeError::InvalidJson)?;
        self.decode_object(&value)
    }

    /// Decode an already parsed object, like the ones embedded inside of an
    /// AdmissionRequest, into the type the caller expects.
    ///
    /// The target type decides the shape. Type metadata found inside of the
    /// object is optional, but when present it must match the target type.
    pub fn decode_object<T: Registered>(&self, value: &serde_json::Value) -> Result<T, DecodeError> {
        let expected = T::group_version_kind();
        if !self.is_registered(&expected) {
            return Err(DecodeError::NotRegistered(expected));
        }

        let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
        let api_version = object.get("apiVersion").and_then(|v| v.as_str());
        let kind = object.get("kind").and_then(|v| v.as_str());
        if let (Some(api_version), Some(kind)) = (api_version, kind) {
            let found = GroupVersionKind::from_api_version(api_version, kind);
            if found != expected {
                return Err(DecodeError::KindMismatch { expected, found });
            }
        }

        T::deserialize(value).map_err(|source| DecodeError::InvalidShape {
            gvk: expected,
            source,
        })
    }
}

fn check_shape<T: DeserializeOwned>(value: &serde_json::Value) -> Result<(), serde_json::Error> {
    T::deserialize(value).map(|_| ())
}

fn type_meta(value: &serde_json::Value) -> Result<GroupVersionKind, DecodeError> {
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;

    let api_version = object
        .get("apiVersion")
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or(DecodeError::MissingApiVersion)?;
    let kind = object
        .get("kind")
        .and_then(|v| v.as_str())
        .filter(|v| !v.is_empty())
        .ok_or(DecodeError::MissingKind)?;

    Ok(GroupVersionKind::from_api_version(api_version, kind))
}
