use std::fs;
use std::io;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageReader, RgbImage};
use ndarray::Array4;

use super::error::{DecodeFailure, ImageDecodeError, ModelLoadError};

/// ImageNet per-channel mean, RGB order.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet per-channel standard deviation, RGB order.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Settings for the fixed resize / crop / normalize pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Target length of the shorter image side before cropping
    pub resize_shorter: u32,
    /// Side length of the square center crop fed to the network
    pub crop_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
    pub filter: FilterType,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            resize_shorter: 256,
            crop_size: 224,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
            filter: FilterType::Triangle,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<(), ModelLoadError> {
        if self.crop_size == 0 || self.resize_shorter == 0 {
            return Err(ModelLoadError::InvalidConfig(
                "resize and crop sizes must be non-zero".to_string(),
            ));
        }
        if self.crop_size > self.resize_shorter {
            return Err(ModelLoadError::InvalidConfig(format!(
                "crop size {} exceeds resize target {}",
                self.crop_size, self.resize_shorter
            )));
        }
        if let Some(std) = self.std.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(ModelLoadError::InvalidConfig(format!(
                "standard deviation must be positive, got {}",
                std
            )));
        }
        Ok(())
    }
}

/// Turns image files into `[1, 3, crop, crop]` normalized tensors.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
}

impl Preprocessor {
    pub fn new(config: PreprocessConfig) -> Result<Self, ModelLoadError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Decodes, resizes, crops and normalizes the image at `path`.
    pub fn load(&self, path: &Path) -> Result<Array4<f32>, ImageDecodeError> {
        let image = decode_rgb(path)?;
        Ok(self.transform(&image))
    }

    pub fn transform(&self, image: &RgbImage) -> Array4<f32> {
        let resized = resize_shorter_side(image, self.config.resize_shorter, self.config.filter);
        let cropped = center_crop(&resized, self.config.crop_size);
        self.normalize(&cropped)
    }

    fn normalize(&self, image: &RgbImage) -> Array4<f32> {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        let PreprocessConfig { mean, std, .. } = &self.config;

        let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
        for (x, y, pixel) in image.enumerate_pixels() {
            for c in 0..3 {
                let value = f32::from(pixel[c]) / 255.0;
                tensor[[0, c, y as usize, x as usize]] = (value - mean[c]) / std[c];
            }
        }
        tensor
    }
}

/// Decodes any supported raster format into 8-bit RGB.
pub fn decode_rgb(path: &Path) -> Result<RgbImage, ImageDecodeError> {
    let fail = |kind| ImageDecodeError::new(path, kind);

    let metadata = fs::metadata(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            fail(DecodeFailure::Missing(e))
        } else {
            fail(DecodeFailure::Unreadable(e))
        }
    })?;
    if !metadata.is_file() {
        return Err(fail(DecodeFailure::NotAFile));
    }
    if metadata.len() == 0 {
        return Err(fail(DecodeFailure::Empty));
    }

    let image = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| fail(DecodeFailure::Unreadable(e)))?
        .decode()
        .map_err(|e| fail(DecodeFailure::Format(e)))?;

    Ok(image.to_rgb8())
}

/// Output dimensions when the shorter side is scaled to `target`.
pub(crate) fn shorter_side_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let scale = |long: u32, short: u32| ((u64::from(target) * u64::from(long)) / u64::from(short)) as u32;
    if width <= height {
        (target, scale(height, width).max(1))
    } else {
        (scale(width, height).max(1), target)
    }
}

fn resize_shorter_side(image: &RgbImage, target: u32, filter: FilterType) -> RgbImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = shorter_side_dimensions(width, height, target);
    if (new_width, new_height) == (width, height) {
        return image.clone();
    }
    imageops::resize(image, new_width, new_height, filter)
}

fn center_crop(image: &RgbImage, size: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let left = crop_offset(width, size);
    let top = crop_offset(height, size);
    imageops::crop_imm(image, left, top, size.min(width), size.min(height)).to_image()
}

/// Half the overhang, with exact halves rounded to the even neighbour
/// (341 -> 58, 229 -> 2).
fn crop_offset(length: u32, size: u32) -> u32 {
    if length <= size {
        return 0;
    }
    (f64::from(length - size) / 2.0).round_ties_even() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_shorter_side_dimensions() {
        assert_eq!(shorter_side_dimensions(100, 100, 256), (256, 256));
        assert_eq!(shorter_side_dimensions(300, 150, 256), (512, 256));
        assert_eq!(shorter_side_dimensions(150, 400, 256), (256, 682));
        assert_eq!(shorter_side_dimensions(640, 480, 256), (341, 256));
    }

    #[test]
    fn test_crop_offset_rounds_to_center() {
        assert_eq!(crop_offset(256, 224), 16);
        assert_eq!(crop_offset(224, 224), 0);
        assert_eq!(crop_offset(100, 224), 0);
    }

    #[test]
    fn test_crop_offset_odd_overhang_rounds_half_to_even() {
        assert_eq!(crop_offset(341, 224), 58);
        assert_eq!(crop_offset(229, 224), 2);
        assert_eq!(crop_offset(227, 224), 2);
        assert_eq!(crop_offset(231, 224), 4);
    }

    #[test]
    fn test_four_by_three_crop_window() {
        // 640x480 resizes to 341x256; the crop starts at column 58.
        let image = RgbImage::from_fn(341, 256, |x, _| Rgb([(x % 256) as u8, 0, 0]));
        let cropped = center_crop(&image, 224);
        assert_eq!(cropped.dimensions(), (224, 224));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([58, 0, 0]));
        assert_eq!(cropped.get_pixel(223, 0), &Rgb([(281 % 256) as u8, 0, 0]));
    }

    #[test]
    fn test_transform_shape_and_normalization() {
        let preprocessor = Preprocessor::new(PreprocessConfig::default()).unwrap();
        let image = RgbImage::from_pixel(640, 480, Rgb([255, 0, 0]));
        let tensor = preprocessor.transform(&image);

        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
        let red = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let green = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        let blue = (0.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
        assert!((tensor[[0, 0, 112, 112]] - red).abs() < 0.02);
        assert!((tensor[[0, 1, 0, 0]] - green).abs() < 0.02);
        assert!((tensor[[0, 2, 223, 223]] - blue).abs() < 0.02);
    }

    #[test]
    fn test_center_crop_takes_middle() {
        let mut image = RgbImage::from_pixel(6, 4, Rgb([0, 0, 0]));
        image.put_pixel(2, 1, Rgb([9, 9, 9]));
        let cropped = center_crop(&image, 2);
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_config_validation() {
        let mut config = PreprocessConfig::default();
        assert!(config.validate().is_ok());

        config.crop_size = 300;
        assert!(matches!(config.validate(), Err(ModelLoadError::InvalidConfig(_))));

        let config = PreprocessConfig {
            std: [0.2, 0.0, 0.2],
            ..PreprocessConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
