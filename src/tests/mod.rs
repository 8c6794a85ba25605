//! Media-level tests
//!
//! Run against small NUT files synthesised at test time, so no sample media
//! has to be checked in.

pub mod e2e;
