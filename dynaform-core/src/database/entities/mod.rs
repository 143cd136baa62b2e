pub mod column_options;
pub mod columns;
pub mod form_details;
pub mod form_values;
pub mod forms;
pub mod payments;
pub mod submitters;
pub mod validation_kinds;
pub mod validation_rules;
