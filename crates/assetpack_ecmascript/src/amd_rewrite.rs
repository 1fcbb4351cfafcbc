use string_wizard::MagicString;

use crate::DefineCall;

/// JSON string literal, valid as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
  serde_json::Value::String(value.to_string()).to_string()
}

/// Turns `define(...)` into `define("name", ...)` for an anonymous define.
pub fn inject_define_name(source: &str, define: &DefineCall, name: &str) -> String {
  let mut magic = MagicString::new(source);
  magic.prepend_left(define.args_start as usize, format!("{}, ", js_string(name)));
  magic.to_string()
}
