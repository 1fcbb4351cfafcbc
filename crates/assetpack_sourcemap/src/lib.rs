mod compose;
mod lines_count;
mod source_joiner;

pub use crate::{
  compose::{compose_joined_map, identity_map},
  lines_count::lines_count,
  source_joiner::{JoinedEntry, JoinedSource, SourceJoiner},
};
pub use oxc_sourcemap::{SourceMap, SourceMapBuilder};
