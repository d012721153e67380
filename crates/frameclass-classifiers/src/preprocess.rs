//! Image to tensor conversion shared by both backends

use crate::descriptor::NormalizationParams;
use frameclass_core::{Error, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Per-channel RGB mean used by torchvision-trained models
pub const TORCHVISION_MEAN_RGB: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel RGB standard deviation used by torchvision-trained models
pub const TORCHVISION_STD_RGB: [f32; 3] = [0.229, 0.224, 0.225];

/// Memory order of a 4-D image tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[batch, height, width, channels]`
    ChannelsLast,
    /// `[batch, channels, height, width]`
    ChannelsFirst,
}

impl TensorLayout {
    /// Infer the layout of an RGB input from a declared 4-D shape
    pub fn infer(shape: &[usize; 4]) -> Option<Self> {
        if shape[3] == 3 {
            Some(Self::ChannelsLast)
        } else if shape[1] == 3 {
            Some(Self::ChannelsFirst)
        } else {
            None
        }
    }

    /// `(height, width)` of a shape in this layout
    pub fn spatial(&self, shape: &[usize; 4]) -> (usize, usize) {
        match self {
            Self::ChannelsLast => (shape[1], shape[2]),
            Self::ChannelsFirst => (shape[2], shape[3]),
        }
    }

    /// Single-image shape in this layout
    pub fn shape(&self, height: usize, width: usize) -> [usize; 4] {
        match self {
            Self::ChannelsLast => [1, height, width, 3],
            Self::ChannelsFirst => [1, 3, height, width],
        }
    }
}

/// Dense float tensor handed to an inference engine
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    pub shape: [usize; 4],
    pub layout: TensorLayout,
    pub data: Vec<f32>,
}

impl InputTensor {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check the buffer against the shape it claims
    pub fn check(&self) -> Result<()> {
        let expected: usize = self.shape.iter().product();
        if expected != self.data.len() {
            return Err(Error::ShapeMismatch {
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Crop the largest centered square out of the image
pub fn center_crop_square(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    imageops::crop_imm(image, x, y, side, side).to_image()
}

/// Nearest-neighbour resize; a no-op copy when the size already matches
pub fn resize_nearest(image: &RgbImage, width: u32, height: u32) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(Error::inference(format!(
            "cannot resize to {}x{}",
            width, height
        )));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::inference("input image is empty"));
    }
    if image.dimensions() == (width, height) {
        return Ok(image.clone());
    }
    Ok(imageops::resize(image, width, height, FilterType::Nearest))
}

/// Convert raw 0..255 pixels with `(pixel - mean) / std` on every channel
pub fn to_tensor_normalized(
    image: &RgbImage,
    layout: TensorLayout,
    params: NormalizationParams,
) -> InputTensor {
    to_tensor_with(image, layout, |_, value| params.apply(value))
}

/// Convert with torchvision normalization: scale to 0..1, then per-channel mean/std, NCHW
pub fn to_tensor_torchvision(image: &RgbImage) -> InputTensor {
    to_tensor_with(image, TensorLayout::ChannelsFirst, |channel, value| {
        (value / 255.0 - TORCHVISION_MEAN_RGB[channel]) / TORCHVISION_STD_RGB[channel]
    })
}

fn to_tensor_with(
    image: &RgbImage,
    layout: TensorLayout,
    normalize: impl Fn(usize, f32) -> f32,
) -> InputTensor {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let plane = width * height;
    let mut data = vec![0.0f32; plane * 3];

    for (x, y, pixel) in image.enumerate_pixels() {
        let offset = y as usize * width + x as usize;
        for channel in 0..3 {
            let value = normalize(channel, pixel[channel] as f32);
            let index = match layout {
                TensorLayout::ChannelsLast => offset * 3 + channel,
                TensorLayout::ChannelsFirst => channel * plane + offset,
            };
            data[index] = value;
        }
    }

    InputTensor {
        shape: layout.shape(height, width),
        layout,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
    }

    #[test]
    fn test_center_crop_landscape() {
        let cropped = center_crop_square(&gradient(10, 6));
        assert_eq!(cropped.dimensions(), (6, 6));
        // Two columns trimmed from each side
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([2, 0, 0]));
    }

    #[test]
    fn test_center_crop_portrait() {
        let cropped = center_crop_square(&gradient(4, 9));
        assert_eq!(cropped.dimensions(), (4, 4));
        assert_eq!(cropped.get_pixel(0, 0), &Rgb([0, 2, 0]));
    }

    #[test]
    fn test_resize_rejects_empty_target() {
        assert!(resize_nearest(&gradient(4, 4), 0, 4).is_err());
        assert!(resize_nearest(&RgbImage::new(0, 0), 4, 4).is_err());
    }

    #[test]
    fn test_resize_dimensions() {
        let resized = resize_nearest(&gradient(10, 10), 3, 5).unwrap();
        assert_eq!(resized.dimensions(), (3, 5));
    }

    #[test]
    fn test_channels_last_normalization() {
        let image = RgbImage::from_pixel(2, 1, Rgb([255, 0, 127]));
        let tensor = to_tensor_normalized(
            &image,
            TensorLayout::ChannelsLast,
            NormalizationParams::new(127.5, 127.5),
        );

        assert_eq!(tensor.shape, [1, 1, 2, 3]);
        tensor.check().unwrap();
        assert_eq!(tensor.data[0], 1.0);
        assert_eq!(tensor.data[1], -1.0);
        assert_eq!(tensor.data[3], 1.0);
    }

    #[test]
    fn test_channels_first_ordering() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([1, 2, 3]));
        image.put_pixel(1, 0, Rgb([4, 5, 6]));

        let tensor = to_tensor_normalized(
            &image,
            TensorLayout::ChannelsFirst,
            NormalizationParams::IDENTITY,
        );
        assert_eq!(tensor.shape, [1, 3, 1, 2]);
        assert_eq!(tensor.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_torchvision_normalization() {
        let image = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let tensor = to_tensor_torchvision(&image);

        assert_eq!(tensor.layout, TensorLayout::ChannelsFirst);
        for channel in 0..3 {
            let expected = (1.0 - TORCHVISION_MEAN_RGB[channel]) / TORCHVISION_STD_RGB[channel];
            assert!((tensor.data[channel] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_layout_inference() {
        assert_eq!(
            TensorLayout::infer(&[1, 224, 224, 3]),
            Some(TensorLayout::ChannelsLast)
        );
        assert_eq!(
            TensorLayout::infer(&[1, 3, 299, 299]),
            Some(TensorLayout::ChannelsFirst)
        );
        assert_eq!(TensorLayout::infer(&[1, 1, 28, 28]), None);
        assert_eq!(TensorLayout::ChannelsFirst.spatial(&[1, 3, 20, 30]), (20, 30));
    }
}
