use itertools::Itertools;

/// Resolves `./` and `../` segments of `name` against the directory of the
/// module name `importer`. Names that are not relative only lose `.` segments.
///
/// Returns `None` when `..` climbs above the top level.
pub fn normalize_module_name(name: &str, importer: Option<&str>) -> Option<String> {
  let is_relative = name.starts_with("./") || name.starts_with("../");
  let mut segments: Vec<&str> = Vec::new();

  if is_relative {
    if let Some(importer) = importer {
      if let Some((dir, _)) = importer.rsplit_once('/') {
        segments.extend(dir.split('/'));
      }
    }
  }

  for segment in name.split('/') {
    match segment {
      "." | "" => {}
      ".." => {
        segments.pop()?;
      }
      _ => segments.push(segment),
    }
  }

  Some(segments.into_iter().join("/"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_names_use_the_importer_directory() {
    assert_eq!(normalize_module_name("./x", Some("a/b")).as_deref(), Some("a/x"));
    assert_eq!(normalize_module_name("../x", Some("a/b/c")).as_deref(), Some("a/x"));
    assert_eq!(normalize_module_name("./x", Some("top")).as_deref(), Some("x"));
    assert_eq!(normalize_module_name("./x", None).as_deref(), Some("x"));
  }

  #[test]
  fn absolute_names_are_cleaned() {
    assert_eq!(normalize_module_name("a/./b", Some("z/y")).as_deref(), Some("a/b"));
    assert_eq!(normalize_module_name("jquery", Some("z/y")).as_deref(), Some("jquery"));
  }

  #[test]
  fn climbing_above_the_top_fails() {
    assert_eq!(normalize_module_name("../x", Some("a")), None);
  }
}
