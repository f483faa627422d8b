//! Library surface of the quantpanel CLI; the logging setup lives here so
//! integration tests can initialise it with a custom writer.

pub mod logging;
