//! Browser side of the contact form: drives the form through its submission
//! states and talks to the contact endpoint.

pub mod api;
pub mod form;
pub mod report;
pub mod token;
