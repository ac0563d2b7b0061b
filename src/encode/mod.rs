pub(crate) mod animation;
pub(crate) mod gif;
pub(crate) mod sink;
pub(crate) mod still;
