pub mod fallback;
pub mod education_form;
