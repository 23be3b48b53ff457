//! Where the files to validate come from.
//!
//! Changeset sweeps take their files from version control (`git`); the
//! full-repository sweep discovers them on disk (`fs`).

pub mod fs;
pub mod git;
