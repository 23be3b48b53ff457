//! Repository-wide registries consulted by the pipeline.

mod conf_json;
mod id_set;

pub use conf_json::{ConfJson, TestEntry};
pub use id_set::{IdSet, IdSetEntry};

use crate::error::ContentError;
use crate::loader::ContentLoader;

fn load_json<T: serde::de::DeserializeOwned>(
    loader: &dyn ContentLoader,
    path: &str,
) -> Result<T, ContentError> {
    let text = loader.read_text(path)?;
    serde_json::from_str(&text).map_err(|e| ContentError::parse(path, e))
}
