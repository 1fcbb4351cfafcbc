use oxc_sourcemap::{SourceMap, SourceMapBuilder};

use crate::{lines_count::lines_count, source_joiner::JoinedSource};

/// Rewrites a map generated against `joined.code` so that every token points
/// into the original source it came from.
///
/// `line_offset` shifts generated lines, e.g. for a banner prepended after
/// minification.
pub fn compose_joined_map(
  generated_json: &str,
  joined: &JoinedSource,
  file: &str,
  line_offset: u32,
) -> anyhow::Result<SourceMap> {
  let generated = SourceMap::from_json_string(generated_json)
    .map_err(|err| anyhow::anyhow!("invalid generated source map: {err:?}"))?;

  let mut builder = SourceMapBuilder::default();
  builder.set_file(file);
  let source_ids = joined
    .entries
    .iter()
    .map(|entry| builder.add_source_and_content(&entry.name, &entry.content))
    .collect::<Vec<_>>();

  for token in generated.get_tokens() {
    if token.get_source_id().is_none() {
      continue;
    }
    let Some((entry_idx, src_line)) = joined.locate(token.get_src_line()) else {
      continue;
    };
    let name_id = token
      .get_name_id()
      .and_then(|id| generated.get_name(id))
      .map(|name| builder.add_name(name.as_ref()));
    builder.add_token(
      token.get_dst_line() + line_offset,
      token.get_dst_col(),
      src_line,
      token.get_src_col(),
      Some(source_ids[entry_idx]),
      name_id,
    );
  }

  Ok(builder.into_sourcemap())
}

/// A line-granular map for output that is `joined.code` verbatim.
pub fn identity_map(joined: &JoinedSource, file: &str, line_offset: u32) -> SourceMap {
  let mut builder = SourceMapBuilder::default();
  builder.set_file(file);

  for entry in &joined.entries {
    let source_id = builder.add_source_and_content(&entry.name, &entry.content);
    let lines = lines_count(&entry.content) + 1;
    for line in 0..lines.min(entry.line_count) {
      builder.add_token(entry.start_line + line + line_offset, 0, line, 0, Some(source_id), None);
    }
  }

  builder.into_sourcemap()
}
