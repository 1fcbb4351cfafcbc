mod amd_rewrite;
mod amd_scanner;
mod ecma_compiler;

pub use crate::{
  amd_rewrite::{inject_define_name, js_string},
  amd_scanner::{AmdScanResult, DefineCall, scan_amd},
  ecma_compiler::{EcmaCompiler, MinifyReturn},
};
