pub(crate) mod face_fit;
