//! IO provider tests.

mod memory_tests;
