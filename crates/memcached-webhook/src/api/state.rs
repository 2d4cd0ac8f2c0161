use admission_review::Scheme;

pub(crate) struct ApiServerState {
    pub(crate) scheme: Scheme,
}
