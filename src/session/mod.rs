pub(crate) mod morph;
pub(crate) mod opts;
pub(crate) mod project;
