pub mod db_errors;
