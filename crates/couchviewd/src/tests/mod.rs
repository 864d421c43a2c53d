//! Test suites for the view server.

mod support;
