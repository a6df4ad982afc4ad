//! Pipeline tests against in-process fakes.

pub(crate) mod fakes;
