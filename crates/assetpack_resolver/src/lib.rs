// Resolves module names of the optimizer against its path table, stub set and loader plugins.

mod module_name;
mod resolver;

pub use crate::{
  module_name::normalize_module_name,
  resolver::{ModuleResolver, ResolveReturn, ResolvedKind},
};
