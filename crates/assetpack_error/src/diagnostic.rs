use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
  /// Malformed manifest or configuration. Raised before anything is written.
  Config,
  /// Module graph problems, only fatal for the optimizer.
  Resolution,
  Io,
  /// Syntax errors in a stylesheet or script, fatal for that unit only.
  Compile,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildDiagnostic {
  #[error("Invalid configuration in {}: {message}", path.display())]
  Config { path: PathBuf, message: String },

  #[error("Cannot resolve module \"{name}\" required by \"{importer}\"")]
  UnresolvedModule { name: String, importer: String },

  #[error("Shim \"{shim}\" depends on \"{name}\", which is neither a known path nor a stub module")]
  UnresolvedShimDependency { shim: String, name: String },

  #[error("Circular dependency: {}", cycle.join(" -> "))]
  CircularDependency { cycle: Vec<String> },

  #[error("Module \"{module}\" ({}) contains {count} anonymous define() calls", path.display())]
  MultipleAnonymousDefines { module: String, path: PathBuf, count: usize },

  #[error("Module \"{module}\" ({}) defines itself by name and also contains an anonymous define()", path.display())]
  StrayAnonymousDefine { module: String, path: PathBuf },

  #[error("Module \"{name}\" uses unsupported loader plugin \"{plugin}\"")]
  UnsupportedPlugin { name: String, plugin: String },

  #[error("Failed to {action} {}: {source}", path.display())]
  Io {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to compile {}: {message}", path.display())]
  Compile { path: PathBuf, message: String },
}

impl BuildDiagnostic {
  pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { action, path: path.into(), source }
  }

  pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
    Self::Config { path: path.into(), message: message.into() }
  }

  pub fn compile(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
    Self::Compile { path: path.into(), message: message.into() }
  }

  pub fn kind(&self) -> DiagnosticKind {
    match self {
      Self::Config { .. } => DiagnosticKind::Config,
      Self::UnresolvedModule { .. }
      | Self::UnresolvedShimDependency { .. }
      | Self::CircularDependency { .. }
      | Self::MultipleAnonymousDefines { .. }
      | Self::StrayAnonymousDefine { .. }
      | Self::UnsupportedPlugin { .. } => DiagnosticKind::Resolution,
      Self::Io { .. } => DiagnosticKind::Io,
      Self::Compile { .. } => DiagnosticKind::Compile,
    }
  }
}

#[test]
fn circular_dependency_message_names_the_whole_chain() {
  let diagnostic = BuildDiagnostic::CircularDependency {
    cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
  };
  assert_eq!(diagnostic.to_string(), "Circular dependency: a -> b -> a");
  assert_eq!(diagnostic.kind(), DiagnosticKind::Resolution);
}
