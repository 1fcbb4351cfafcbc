mod diagnostic;

use std::ops::{Deref, DerefMut};

pub use crate::diagnostic::{BuildDiagnostic, DiagnosticKind};

/// Every fatal error collected while running one or more tasks.
#[derive(Debug, Default)]
pub struct BuildError(pub Vec<anyhow::Error>);

impl BuildError {
  /// Kinds of the errors that carry a [`BuildDiagnostic`], in order.
  pub fn kinds(&self) -> Vec<DiagnosticKind> {
    self.0.iter().filter_map(diagnostic_kind).collect()
  }

  pub fn into_vec(self) -> Vec<anyhow::Error> {
    self.0
  }
}

impl Deref for BuildError {
  type Target = Vec<anyhow::Error>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl DerefMut for BuildError {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.0
  }
}

impl From<anyhow::Error> for BuildError {
  fn from(error: anyhow::Error) -> Self {
    Self(vec![error])
  }
}

impl From<BuildDiagnostic> for BuildError {
  fn from(diagnostic: BuildDiagnostic) -> Self {
    Self(vec![diagnostic.into()])
  }
}

impl From<Vec<anyhow::Error>> for BuildError {
  fn from(errors: Vec<anyhow::Error>) -> Self {
    Self(errors)
  }
}

impl std::fmt::Display for BuildError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (idx, error) in self.0.iter().enumerate() {
      if idx > 0 {
        writeln!(f)?;
      }
      write!(f, "{error:#}")?;
    }
    Ok(())
  }
}

pub type BuildResult<T> = anyhow::Result<T, BuildError>;

/// Looks through context layers added with `anyhow::Context`.
pub fn diagnostic_kind(error: &anyhow::Error) -> Option<DiagnosticKind> {
  error.downcast_ref::<BuildDiagnostic>().map(BuildDiagnostic::kind)
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use anyhow::Context;

  use super::*;

  #[test]
  fn kinds_survive_context() {
    let error = anyhow::Error::from(BuildDiagnostic::UnresolvedModule {
      name: "foo".to_string(),
      importer: "app".to_string(),
    });
    let error = Err::<(), _>(error).context("optimizing bundle").unwrap_err();

    let build_error = BuildError::from(vec![
      error,
      BuildDiagnostic::Compile { path: PathBuf::from("a.less"), message: "oops".to_string() }
        .into(),
      anyhow::anyhow!("untyped"),
    ]);

    assert_eq!(build_error.kinds(), vec![DiagnosticKind::Resolution, DiagnosticKind::Compile]);
    assert!(build_error.to_string().contains("\"foo\""));
  }
}
