//! Vertical feature slices.

pub mod vrp;
