pub mod time;
pub mod validated_form;
