// Library root: the pure draft domain shared by every front end.
//
// Nothing in this crate performs I/O. The app crate layers persistence,
// the per-draft actor, and notification fan-out on top of it.

pub mod franchise;
pub mod player;
pub mod rules;
pub mod scoring;
pub mod season;
pub mod validation;
