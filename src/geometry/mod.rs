pub(crate) mod controller;
pub(crate) mod fit;
pub(crate) mod padding;
