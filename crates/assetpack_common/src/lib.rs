mod manifest;
mod module_config;
mod options;
mod types;

pub use crate::{
  manifest::{BundleSpec, ResourceManifest, StyleSheet},
  module_config::{
    GlobalAssignment, InitDescription, ModuleConfig, ModulePathTable, ShimConfig, ShimExport,
    ShimTable, StubSet,
  },
  options::{
    CopyEntry, CssOptions, ModuleGroup, OptimizerOptions, PathRemap, ProjectOptions, RawShim,
    RawShimConfig, StampOptions, VendorOptions,
    normalized_options::{
      NormalizedCssOptions, NormalizedOptimizerOptions, NormalizedOptions, NormalizedStampOptions,
      NormalizedVendorOptions,
    },
  },
  types::{
    output_asset::{AssetKind, OutputAsset},
    raw_idx::ModuleIdx,
    vendor_package::VendorPackage,
  },
};
