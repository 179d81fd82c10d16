//! Misc helpers shared across the pipeline.

pub mod file_system;

/// Converts a vector of string slices into owned strings, for building
/// subprocess argument lists.
pub fn to_owned(args: Vec<&str>) -> Vec<String> {
    args.into_iter().map(String::from).collect()
}
