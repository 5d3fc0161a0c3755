//! Integration tests for the credential offer lifecycle stack live under
//! `tests/`. This crate has no library surface.
