use std::sync::Arc;

use assetpack_common::{NormalizedOptions, ResourceManifest};

pub type SharedOptions = Arc<NormalizedOptions>;
pub type SharedManifest = Arc<ResourceManifest>;
