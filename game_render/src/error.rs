use thiserror::Error;

/// The closed set of failure modes the render-side half of the pipeline can surface (§7),
/// complementing [`game_asset::AssetError`] on the GPU materialization side of the seam.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("bindless resource pool exhausted ({capacity} slots)")]
    PoolFull { capacity: usize },

    #[error("failed to build shared material: {0}")]
    MaterialBuildFailed(String),

    #[error("asset error: {0}")]
    Asset(#[from] game_asset::AssetError),

    #[error("fatal render error: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;
