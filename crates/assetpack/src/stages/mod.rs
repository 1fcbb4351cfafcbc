pub mod concat;
pub mod copy;
pub mod css;
pub mod stamp;

use assetpack_common::OutputAsset;
use assetpack_error::{BuildError, BuildResult};

/// Merges the results of independent units of one stage. Every failure is
/// kept; outputs of the units that succeeded are only returned when none failed.
pub(crate) fn collect_outputs<I>(results: I) -> BuildResult<Vec<OutputAsset>>
where
  I: IntoIterator<Item = BuildResult<Vec<OutputAsset>>>,
{
  let mut errors = BuildError::default();
  let mut assets = Vec::new();
  for result in results {
    match result {
      Ok(outputs) => assets.extend(outputs),
      Err(err) => errors.extend(err.into_vec()),
    }
  }
  if errors.is_empty() { Ok(assets) } else { Err(errors) }
}
