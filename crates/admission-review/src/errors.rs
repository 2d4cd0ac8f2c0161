use thiserror::Error;

use crate::group_version::GroupVersionKind;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("couldn't parse JSON payload: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("Object 'apiVersion' is missing")]
    MissingApiVersion,

    #[error("Object 'Kind' is missing")]
    MissingKind,

    #[error("no kind \"{}\" is registered for version \"{}\"", .0.kind, .0.api_version())]
    NotRegistered(GroupVersionKind),

    #[error("expected {expected} but the object describes itself as {found}")]
    KindMismatch {
        expected: GroupVersionKind,
        found: GroupVersionKind,
    },

    #[error("cannot decode {gvk}: {source}")]
    InvalidShape {
        gvk: GroupVersionKind,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("cannot serialize object: {0}")]
    Serialize(#[source] serde_json::Error),
}
