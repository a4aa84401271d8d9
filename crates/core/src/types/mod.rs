pub mod document_id;
pub mod path;
pub mod rating;
