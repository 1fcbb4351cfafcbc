pub mod output_asset;
pub mod raw_idx;
pub mod vendor_package;
