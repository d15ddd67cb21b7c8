//! Conversions between `image` crate buffers and equipmatch buffers.

use crate::image::{ImageView, OwnedImage};
use crate::util::{EquipMatchError, EquipMatchResult};
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::Path;

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &GrayImage) -> EquipMatchResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Takes ownership of a grayscale image buffer without copying.
pub fn owned_from_gray_image(img: GrayImage) -> EquipMatchResult<OwnedImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    OwnedImage::new(img.into_raw(), width, height)
}

/// Converts any decoded image to an owned grayscale image.
pub fn owned_from_dynamic_image(img: &DynamicImage) -> EquipMatchResult<OwnedImage> {
    owned_from_gray_image(img.to_luma8())
}

/// Loads an image from disk and converts it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> EquipMatchResult<OwnedImage> {
    let img = open_image(path.as_ref())?;
    owned_from_dynamic_image(&img)
}

fn open_image(path: &Path) -> EquipMatchResult<DynamicImage> {
    image::open(path).map_err(|err| EquipMatchError::ImageIo {
        reason: format!("{}: {err}", path.display()),
    })
}

/// A decoded input photograph: the colour buffer plus its grayscale form.
///
/// The grayscale buffer is derived once at construction and shared by every
/// template scored against this probe.
#[derive(Clone, Debug)]
pub struct ProbeImage {
    color: RgbImage,
    gray: OwnedImage,
}

impl ProbeImage {
    /// Wraps a colour image, deriving its luma channel.
    pub fn from_rgb(color: RgbImage) -> EquipMatchResult<Self> {
        let gray = owned_from_gray_image(image::imageops::grayscale(&color))?;
        Ok(Self { color, gray })
    }

    /// Converts an arbitrary decoded image into a probe.
    pub fn from_dynamic(img: &DynamicImage) -> EquipMatchResult<Self> {
        Self::from_rgb(img.to_rgb8())
    }

    /// Opens and decodes an image file.
    pub fn open<P: AsRef<Path>>(path: P) -> EquipMatchResult<Self> {
        let img = open_image(path.as_ref())?;
        Self::from_dynamic(&img)
    }

    /// Builds a probe from a grayscale buffer; the colour form is the gray
    /// value replicated on all three channels.
    pub fn from_gray(gray: OwnedImage) -> Self {
        let color = RgbImage::from_fn(gray.width() as u32, gray.height() as u32, |x, y| {
            let v = gray.data()[y as usize * gray.width() + x as usize];
            image::Rgb([v, v, v])
        });
        Self { color, gray }
    }

    pub fn color(&self) -> &RgbImage {
        &self.color
    }

    pub fn gray(&self) -> ImageView<'_, u8> {
        self.gray.view()
    }

    pub fn width(&self) -> usize {
        self.gray.width()
    }

    pub fn height(&self) -> usize {
        self.gray.height()
    }
}

#[cfg(test)]
mod tests {
    use super::{owned_from_gray_image, view_from_gray_image, ProbeImage};
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn probe_derives_gray_once_with_matching_size() {
        let rgb = RgbImage::from_pixel(5, 3, Rgb([200, 200, 200]));
        let probe = ProbeImage::from_rgb(rgb).unwrap();
        assert_eq!(probe.width(), 5);
        assert_eq!(probe.height(), 3);
        assert_eq!(probe.gray().get(4, 2).copied(), Some(200));
    }

    #[test]
    fn empty_colour_image_is_rejected() {
        let rgb = RgbImage::new(0, 4);
        assert!(ProbeImage::from_rgb(rgb).is_err());
    }

    #[test]
    fn gray_buffers_convert_without_reordering() {
        let gray = GrayImage::from_fn(4, 2, |x, y| Luma([(y * 4 + x) as u8]));
        let view = view_from_gray_image(&gray).unwrap();
        assert_eq!(view.row(1).unwrap(), &[4u8, 5, 6, 7]);

        let probe = ProbeImage::from_gray(owned_from_gray_image(gray).unwrap());
        assert_eq!(*probe.color().get_pixel(3, 1), Rgb([7, 7, 7]));
    }
}
