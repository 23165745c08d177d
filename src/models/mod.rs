pub mod form_type;
pub mod pending_submission;

pub use form_type::FormType;
pub use pending_submission::PendingSubmission;
