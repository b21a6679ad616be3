//! Custom request extractors.

mod form_params;
mod validated_json;

pub use form_params::SubmittedForm;
pub use validated_json::ValidatedJson;
