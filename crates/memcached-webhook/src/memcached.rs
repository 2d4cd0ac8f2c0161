use admission_review::{GroupVersionKind, GroupVersionResource, Registered};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

pub const GROUP: &str = "cache.example.com";
pub const VERSION: &str = "v1alpha1";
pub const KIND: &str = "Memcached";
pub const RESOURCE: &str = "memcacheds";

/// The Memcached custom resource, as managed by the memcached operator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memcached {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: MemcachedSpec,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemcachedSpec {
    /// Number of memcached instances. Omitted means 0.
    #[serde(default)]
    pub size: i32,
}

impl Memcached {
    /// The REST resource this webhook is registered for.
    pub fn group_version_resource() -> GroupVersionResource {
        GroupVersionResource::new(GROUP, VERSION, RESOURCE)
    }
}

impl Registered for Memcached {
    fn group_version_kind() -> GroupVersionKind {
        GroupVersionKind::new(GROUP, VERSION, KIND)
    }
}
