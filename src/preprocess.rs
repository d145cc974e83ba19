use image::{imageops::FilterType, GenericImageView};
use ndarray::{Array, Ix4};
use std::path::PathBuf;
use thiserror::Error;

/// Model input resolution. Must match the classifier's input layer.
pub const INPUT_SIZE: u32 = 224;

#[derive(Debug, Error)]
pub enum PreprocessingError {
    #[error("failed to read image file {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to probe image format: {0}")]
    UnknownFormat(std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decodes an image payload into the classifier's input tensor.
///
/// Any valid JPEG/PNG of any resolution comes out as a `[1, 224, 224, 3]`
/// array with every channel scaled to `[0, 1]`. Alpha is dropped and
/// grayscale is expanded to three channels.
pub fn normalize(image_data: &[u8]) -> Result<Array<f32, Ix4>, PreprocessingError> {
    let image_reader = image::ImageReader::new(std::io::Cursor::new(image_data))
        .with_guessed_format()
        .map_err(PreprocessingError::UnknownFormat)?;

    let original_img = image_reader.decode()?;

    let img = original_img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom);

    let (h, w) = (INPUT_SIZE as usize, INPUT_SIZE as usize);
    let mut input = Array::zeros((1, h, w, 3));
    for pixel in img.pixels() {
        let x = pixel.0 as usize;
        let y = pixel.1 as usize;
        let [r, g, b, _] = pixel.2 .0;
        input[[0, y, x, 0]] = (r as f32) / 255.;
        input[[0, y, x, 1]] = (g as f32) / 255.;
        input[[0, y, x, 2]] = (b as f32) / 255.;
    }

    Ok(input)
}
