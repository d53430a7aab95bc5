pub(crate) mod decode;
pub(crate) mod photo;
pub(crate) mod source;
