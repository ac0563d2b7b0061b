pub(crate) mod backend;
pub(crate) mod blend;
pub(crate) mod capture;
pub(crate) mod cpu;
