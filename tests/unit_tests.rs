//! Component-level tests.

mod unit;
