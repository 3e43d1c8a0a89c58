//! Document export backends.

pub mod docx;

pub use docx::export_proposal_to_docx;
