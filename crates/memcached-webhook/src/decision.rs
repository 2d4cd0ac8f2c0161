use admission_review::{AdmissionResponse, AdmissionReview, Scheme};
use std::fmt;
use tracing::{debug, warn};

use crate::memcached::Memcached;

/// A decision function: looks at the review and produces a verdict.
/// It never deals with the request uid, that's owned by the HTTP layer.
pub type Decision = fn(&AdmissionReview, &Scheme) -> AdmissionResponse;

/// The admission phases served by this webhook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionPhase {
    Mutating,
    Validating,
}

impl AdmissionPhase {
    pub const ALL: [AdmissionPhase; 2] = [AdmissionPhase::Mutating, AdmissionPhase::Validating];

    pub fn path(self) -> &'static str {
        match self {
            AdmissionPhase::Mutating => "/mutate",
            AdmissionPhase::Validating => "/validate",
        }
    }

    pub fn decision(self) -> Decision {
        match self {
            AdmissionPhase::Mutating => mutate,
            AdmissionPhase::Validating => validate,
        }
    }

    pub fn decide(self, review: &AdmissionReview, scheme: &Scheme) -> AdmissionResponse {
        (self.decision())(review, scheme)
    }
}

impl fmt::Display for AdmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AdmissionPhase::Mutating => write!(f, "mutating"),
            AdmissionPhase::Validating => write!(f, "validating"),
        }
    }
}

/// Admit Memcached objects only when they ask for at least one instance.
pub fn mutate(review: &AdmissionReview, scheme: &Scheme) -> AdmissionResponse {
    let Some(request) = review.request.as_ref() else {
        return AdmissionResponse::deny("AdmissionReview does not contain a request");
    };

    let expected = Memcached::group_version_resource();
    if request.resource != expected {
        // a webhook configuration routing other resources here is a mistake,
        // refuse instead of letting them through
        warn!(
            expected = %expected,
            resource = %request.resource,
            "unexpected resource"
        );
        return AdmissionResponse::deny(format!(
            "expected resource to be {expected}, got {}",
            request.resource
        ));
    }

    let Some(object) = request.object.as_ref() else {
        return AdmissionResponse::deny("request does not contain an object");
    };

    let memcached: Memcached = match scheme.decode_object(&object.0) {
        Ok(memcached) => memcached,
        Err(error) => {
            warn!(error = %error, "cannot decode Memcached object");
            return AdmissionResponse::deny(error.to_string());
        }
    };

    debug!(
        name = memcached.metadata.name.as_deref().unwrap_or_default(),
        size = memcached.spec.size,
        "mutating memcached"
    );

    if memcached.spec.size <= 0 {
        return AdmissionResponse::deny("size needs to be > 0");
    }

    AdmissionResponse::allow("memcached size is valid")
}

/// Accepts everything for now.
pub fn validate(_review: &AdmissionReview, _scheme: &Scheme) -> AdmissionResponse {
    debug!("validating memcached");
    AdmissionResponse::allow("validation passed")
}
