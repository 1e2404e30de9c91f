//! Quran text serving for Deenify
//!
//! The full text is mirrored from alquran.cloud into the local store once
//! (three editions: Arabic, transliteration, Indonesian translation) and
//! served read-only from there.

#[cfg(feature = "openapi")]
pub mod doc;
pub mod handlers;
pub mod logic;
pub mod routes;

pub use logic::QuranService;
pub use routes::routes;
