use assetpack_utils::concat_string;
use chrono::{SecondsFormat, Utc};

/// Replaces every `{key}` placeholder of `template`.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
  values
    .iter()
    .fold(template.to_string(), |rendered, (key, value)| {
      rendered.replace(&concat_string!("{", key, "}"), value)
    })
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-05-01T09:30:00.125Z`.
pub fn timestamp() -> String {
  Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[test]
fn test_render_template() {
  let rendered = render_template("/* {name} at {timestamp}, {name} */\n", &[
    ("name", "karl-ui.min.js"),
    ("timestamp", "2024-05-01T09:30:00.125Z"),
  ]);
  assert_eq!(rendered, "/* karl-ui.min.js at 2024-05-01T09:30:00.125Z, karl-ui.min.js */\n");
  assert_eq!(render_template("{unknown}", &[("name", "x")]), "{unknown}");
}

#[test]
fn test_timestamp_shape() {
  let value = timestamp();
  assert_eq!(value.len(), "2024-05-01T09:30:00.125Z".len());
  assert!(value.ends_with('Z'));
  assert_eq!(&value[19..20], ".");
}
