pub mod extractor;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod recovery;
