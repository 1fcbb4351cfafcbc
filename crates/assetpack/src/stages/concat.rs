use anyhow::Context;
use assetpack_common::{AssetKind, BundleSpec, NormalizedOptions, OutputAsset, ResourceManifest};
use assetpack_ecmascript::EcmaCompiler;
use assetpack_error::{BuildDiagnostic, BuildResult};
use assetpack_fs::FileSystem;
use assetpack_sourcemap::{SourceJoiner, SourceMap, compose_joined_map, identity_map, lines_count};
use assetpack_utils::{
  concat_string,
  rayon::{IntoParallelRefIterator, ParallelIterator},
};
use tracing::info;

use super::collect_outputs;
use crate::utils::render_template::{render_template, timestamp};

pub struct CompiledBundle {
  pub code: String,
  pub map: SourceMap,
}

/// Joins and minifies the script bundles of the resource manifest.
pub struct ConcatStage<'a> {
  fs: &'a dyn FileSystem,
  options: &'a NormalizedOptions,
  manifest: &'a ResourceManifest,
}

impl<'a> ConcatStage<'a> {
  pub fn new(
    fs: &'a dyn FileSystem,
    options: &'a NormalizedOptions,
    manifest: &'a ResourceManifest,
  ) -> Self {
    Self { fs, options, manifest }
  }

  pub fn run(&self) -> BuildResult<Vec<OutputAsset>> {
    let specs = self.manifest.bundle_specs(&self.options.cwd);
    let results = specs.par_iter().map(|spec| self.build_bundle(spec)).collect::<Vec<_>>();
    collect_outputs(results)
  }

  pub fn build_bundle(&self, spec: &BundleSpec) -> BuildResult<Vec<OutputAsset>> {
    let bundle = self
      .compile_bundle(spec)
      .with_context(|| format!("Failed to build bundle \"{}\"", spec.name))?;

    let map = bundle.map.to_json_string();
    self
      .fs
      .write_atomic(&spec.output, bundle.code.as_bytes())
      .map_err(|err| BuildDiagnostic::io("write", &spec.output, err))?;
    self
      .fs
      .write_atomic(&spec.map_output, map.as_bytes())
      .map_err(|err| BuildDiagnostic::io("write", &spec.map_output, err))?;

    info!("built {} from {} files", spec.file_name(), spec.sources.len());
    Ok(vec![
      OutputAsset::new(AssetKind::Script, &spec.output, bundle.code.len()),
      OutputAsset::new(AssetKind::SourceMap, &spec.map_output, map.len()),
    ])
  }

  pub fn compile_bundle(&self, spec: &BundleSpec) -> anyhow::Result<CompiledBundle> {
    let mut joiner = SourceJoiner::default();
    for (reference, path) in &spec.sources {
      let source =
        self.fs.read_to_string(path).map_err(|err| BuildDiagnostic::io("read", path, err))?;
      let code = EcmaCompiler::blank_use_strict(&source, path)?;
      joiner.append_source(reference.as_str(), code, source);
    }
    let joined = joiner.join();

    let file_name = spec.file_name();
    let mut banner = render_template(&self.options.banner, &[
      ("name", file_name.as_str()),
      ("timestamp", timestamp().as_str()),
    ]);
    if !banner.is_empty() && !banner.ends_with('\n') {
      banner.push('\n');
    }
    let line_offset = lines_count(&banner);

    let (code, map) = if self.options.minify {
      let minified = EcmaCompiler::minify(&joined.code, &spec.output, Some(&file_name))?;
      let generated = minified.map.context("The minifier returned no source map")?;
      let map = compose_joined_map(&generated, &joined, &file_name, line_offset)?;
      (minified.code, map)
    } else {
      let map = identity_map(&joined, &file_name, line_offset);
      (joined.code, map)
    };

    let code = concat_string!(
      banner,
      code.trim_end(),
      "\n//# sourceMappingURL=",
      spec.map_file_name(),
      "\n"
    );
    Ok(CompiledBundle { code, map })
  }
}
