//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `operation_mode`: Operation mode determination tests
//! - `field_resolution`: Token, repository, and directory resolution tests
//! - `validation`: Configuration consistency validation tests

mod helpers;
mod operation_mode;
