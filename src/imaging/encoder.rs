//! Encoder stage: serializes the finished composite.

use super::backend::{BackendError, EncodedImage, RasterSurface};
use super::params::EncodeParams;
use crate::config::WatermarkOptions;
use tracing::info;

pub fn encode_params(options: &WatermarkOptions) -> EncodeParams {
    EncodeParams {
        format: options.output_format,
        quality: options.jpeg_quality(),
    }
}

pub fn encode<S: RasterSurface>(
    surface: &S,
    params: &EncodeParams,
) -> Result<EncodedImage, BackendError> {
    let encoded = surface.encode(params)?;
    info!(
        format = %encoded.format,
        width = encoded.width,
        height = encoded.height,
        bytes = encoded.bytes.len(),
        "encoded watermarked image"
    );
    Ok(encoded)
}
