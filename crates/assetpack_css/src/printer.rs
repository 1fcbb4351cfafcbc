/// Flattened CSS, ready to be printed and handed to lightningcss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CssItem {
  Rule { selectors: Vec<String>, declarations: Vec<(String, String)> },
  /// Conditional and keyframes blocks holding other items.
  Block { prelude: String, items: Vec<CssItem> },
  /// `@font-face`, `@page` and other at-rules holding declarations.
  DeclarationBlock { prelude: String, declarations: Vec<(String, String)> },
  Statement(String),
}

pub fn print(items: &[CssItem]) -> String {
  let mut out = String::new();
  print_items(items, &mut out, 0);
  out
}

fn print_items(items: &[CssItem], out: &mut String, depth: usize) {
  let indent = "  ".repeat(depth);
  for item in items {
    match item {
      CssItem::Rule { selectors, declarations } => {
        let separator = format!(",\n{indent}");
        out.push_str(&format!("{indent}{} {{\n", selectors.join(&separator)));
        print_declarations(declarations, out, depth + 1);
        out.push_str(&format!("{indent}}}\n"));
      }
      CssItem::Block { prelude, items } => {
        out.push_str(&format!("{indent}{prelude} {{\n"));
        print_items(items, out, depth + 1);
        out.push_str(&format!("{indent}}}\n"));
      }
      CssItem::DeclarationBlock { prelude, declarations } => {
        out.push_str(&format!("{indent}{prelude} {{\n"));
        print_declarations(declarations, out, depth + 1);
        out.push_str(&format!("{indent}}}\n"));
      }
      CssItem::Statement(statement) => {
        out.push_str(&format!("{indent}{statement};\n"));
      }
    }
  }
}

fn print_declarations(declarations: &[(String, String)], out: &mut String, depth: usize) {
  let indent = "  ".repeat(depth);
  for (name, value) in declarations {
    out.push_str(&format!("{indent}{name}: {value};\n"));
  }
}

#[test]
fn prints_nested_blocks() {
  let items = vec![
    CssItem::Statement("@charset \"utf-8\"".to_string()),
    CssItem::Block {
      prelude: "@media print".to_string(),
      items: vec![CssItem::Rule {
        selectors: vec![".a".to_string(), ".b".to_string()],
        declarations: vec![("color".to_string(), "red".to_string())],
      }],
    },
  ];
  assert_eq!(
    print(&items),
    "@charset \"utf-8\";\n@media print {\n  .a,\n  .b {\n    color: red;\n  }\n}\n"
  );
}
