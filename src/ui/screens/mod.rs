pub(crate) mod catalog;
pub(crate) mod history;
pub(crate) mod import;
pub(crate) mod missing;
