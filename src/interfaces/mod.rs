//! Inbound and outbound file formats of the command-line front end.

pub mod csv;
