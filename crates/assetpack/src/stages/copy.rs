use std::{io, path::Path};

use assetpack_common::{AssetKind, NormalizedOptions, OutputAsset, ResourceManifest, VendorPackage};
use assetpack_error::{BuildDiagnostic, BuildResult};
use assetpack_fs::FileSystem;
use assetpack_utils::{
  concat_string,
  path_ext::PathExt,
  rayon::{IntoParallelRefIterator, ParallelIterator},
};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::collect_outputs;

/// Mirrors third-party trees into the distribution tree.
pub struct CopyStage<'a> {
  fs: &'a dyn FileSystem,
  packages: Vec<VendorPackage>,
}

impl<'a> CopyStage<'a> {
  pub fn new(
    fs: &'a dyn FileSystem,
    options: &NormalizedOptions,
    manifest: &ResourceManifest,
  ) -> Self {
    Self { fs, packages: vendor_packages(options, manifest) }
  }

  pub fn run(&self) -> BuildResult<Vec<OutputAsset>> {
    let results = self
      .packages
      .par_iter()
      .map(|package| copy_package(self.fs, package).map(|asset| vec![asset]))
      .collect::<Vec<_>>();
    collect_outputs(results)
  }
}

/// `vendor.packages` first, then the explicit `vendor.copies`.
pub fn vendor_packages(options: &NormalizedOptions, manifest: &ResourceManifest) -> Vec<VendorPackage> {
  let vendor = &options.vendor;
  let packages = vendor.packages.iter().map(|name| VendorPackage {
    name: name.clone(),
    source: vendor.source_root.join(name),
    destination: manifest.resolve(&options.cwd, &concat_string!(vendor.dest_dir, name)),
    include: None,
  });
  let copies = vendor.copies.iter().map(|copy| VendorPackage {
    name: copy.from.clone(),
    source: vendor.source_root.join(&copy.from),
    destination: manifest.resolve(&options.cwd, &copy.to),
    include: copy.include.clone(),
  });
  packages.chain(copies).collect()
}

pub fn copy_package(fs: &dyn FileSystem, package: &VendorPackage) -> BuildResult<OutputAsset> {
  if !fs.exists(&package.source) {
    let err = io::Error::new(io::ErrorKind::NotFound, "no such file or directory");
    return Err(BuildDiagnostic::io("copy vendor package from", &package.source, err).into());
  }

  let mut size = 0;
  let mut files = 0;

  if fs.is_dir(&package.source) {
    for entry in WalkDir::new(&package.source).sort_by_file_name() {
      let entry = entry.map_err(|err| {
        let path = err.path().unwrap_or(&package.source).to_path_buf();
        BuildDiagnostic::io("walk", path, err.into())
      })?;
      if entry.file_type().is_dir() {
        continue;
      }
      let relative = entry.path().strip_prefix(&package.source).unwrap_or(entry.path());
      if let Some(include) = &package.include {
        if !fast_glob::glob_match(include, relative.to_slash_string()) {
          continue;
        }
      }
      size += copy_file(fs, entry.path(), &package.destination.join(relative))?;
      files += 1;
    }
  } else if let Some(file_name) = package.source.file_name() {
    size += copy_file(fs, &package.source, &package.destination.join(file_name))?;
    files += 1;
  }

  info!("copied {files} files of {} to {}", package.name, package.destination.display());
  Ok(OutputAsset::new(AssetKind::Vendor, &package.destination, size))
}

/// Leaves destinations that already hold the same bytes untouched.
fn copy_file(fs: &dyn FileSystem, from: &Path, to: &Path) -> Result<usize, BuildDiagnostic> {
  let content = fs.read(from).map_err(|err| BuildDiagnostic::io("read", from, err))?;
  if fs.read(to).is_ok_and(|existing| existing == content) {
    debug!("{} is up to date", to.display());
  } else {
    fs.write_atomic(to, &content).map_err(|err| BuildDiagnostic::io("write", to, err))?;
  }
  Ok(content.len())
}
