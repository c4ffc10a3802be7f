//! Pipeline engine tests.

mod pipeline_e2e;
mod source_tests;
