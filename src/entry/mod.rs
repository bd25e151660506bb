mod controller;
mod form;

pub use controller::{PopupController, ResultDialog, SubmitRejected};
pub use form::{EntryForm, FieldErrors};
