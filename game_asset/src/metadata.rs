use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

use crate::id::{AssetId, AssetPath};
use crate::settings::ImportSetting;
use crate::types::{AssetType, FileType};

/// The persistent, human-readable sidecar describing a single asset (§3).
///
/// Stored as `Metadata/<uuid>.meta` under the project root, one file per [`AssetId`]. Unknown
/// top-level fields are preserved verbatim across a load/save round trip (`extra`) so that a
/// newer editor build can add fields without an older one discarding them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: AssetId,
    pub path: AssetPath,
    pub file_type: FileType,
    pub asset_type: AssetType,
    pub import_setting: ImportSetting,
    /// The content hash framed at the head of this asset's intermediate file as of the last
    /// successful import, or `None` if no intermediate has ever been written (§3 "IntermediateHash
    /// is either 0 or equal to the hash stored in the leading bytes of the intermediate file").
    pub intermediate_hash: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn new(path: AssetPath, file_type: FileType, asset_type: AssetType) -> Self {
        Self {
            id: AssetId::new(),
            path,
            file_type,
            asset_type,
            import_setting: ImportSetting::default_for(asset_type),
            intermediate_hash: None,
            extra: Map::new(),
        }
    }

    pub fn intermediate_file_name(&self) -> String {
        format!("{}.bin", self.id)
    }

    pub fn meta_file_name(&self) -> String {
        format!("{}.meta", self.id)
    }
}
