pub mod concat_string;
pub mod data_url;
pub mod indexmap;
pub mod path_ext;
pub mod rayon;
