pub mod column_service;
pub mod form_detail_service;
pub mod form_service;
pub mod option_service;
pub mod otp_store;
pub mod payment_coordinator;
pub mod schema_assembler;
pub mod signature;
pub mod submission_validator;
pub mod submission_writer;
pub mod submitter_service;
pub mod validation;
pub mod validation_rule_service;

pub use column_service::ColumnService;
pub use form_detail_service::FormDetailService;
pub use form_service::FormService;
pub use option_service::OptionService;
pub use otp_store::{InMemoryOtpStore, OtpStore};
pub use payment_coordinator::{PaidReceipt, PaidSubmission, PaymentCoordinator, PaymentSettings};
pub use schema_assembler::SchemaAssembler;
pub use submission_validator::{SubmissionValidator, ValidationMode};
pub use submission_writer::SubmissionWriter;
pub use submitter_service::SubmitterService;
pub use validation::*;
pub use validation_rule_service::ValidationRuleService;
