use serde_json::{Map, Value};

use crate::error::{ImportError, Result};
use crate::package::MediaFile;

/// Archive entry holding the media manifest.
pub const MEDIA_ENTRY: &str = "media";

/// Decode the manifest: a JSON object mapping numbered archive entries to
/// original file names, e.g. `{"0": "cat.jpg"}`.
pub(crate) fn parse_manifest(bytes: &[u8]) -> Result<Vec<MediaFile>> {
    let object: Map<String, Value> =
        serde_json::from_slice(bytes).map_err(|e| ImportError::malformed(MEDIA_ENTRY, e))?;

    object
        .into_iter()
        .map(|(entry, value)| match value {
            Value::String(name) => Ok(MediaFile { entry, name }),
            other => Err(ImportError::malformed(
                MEDIA_ENTRY,
                format!("entry {entry} maps to {other}, expected a file name"),
            )),
        })
        .collect()
}
