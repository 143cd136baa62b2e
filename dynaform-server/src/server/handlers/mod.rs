pub mod bindings;
pub mod columns;
pub mod forms;
pub mod health;
pub mod options;
pub mod payments;
pub mod submissions;
pub mod submitters;
pub mod validations;

mod values;
