pub mod footer;
pub mod prompt_form;
pub mod status_line;
