pub(crate) mod analysis;
pub(crate) mod extract;
pub(crate) mod health;
pub(crate) mod search;
