//! Reference images and the naming rule that groups them into categories.

use crate::image::{ImageView, OwnedImage};
use crate::util::EquipMatchResult;

mod plan;

pub use plan::TemplatePlan;

/// Separator between the category prefix and the rest of a template name.
pub const CATEGORY_SEPARATOR: char = '_';

/// Derives the category of a template from its name.
///
/// The category is the text before the first `_`, or the whole name when it
/// has no separator: `aed_front` and `aed_2` belong to `aed`, `oxygen` to
/// `oxygen`.
pub fn category_of(name: &str) -> &str {
    match name.split_once(CATEGORY_SEPARATOR) {
        Some((prefix, _)) => prefix,
        None => name,
    }
}

/// An immutable, named grayscale reference picture of one equipment item.
#[derive(Clone, Debug)]
pub struct ReferenceImage {
    name: String,
    image: OwnedImage,
    plan: TemplatePlan,
}

impl ReferenceImage {
    /// Creates a reference image and precomputes its correlation plan.
    pub fn new(name: impl Into<String>, image: OwnedImage) -> Self {
        let plan = TemplatePlan::from_view(image.view());
        Self {
            name: name.into(),
            image,
            plan,
        }
    }

    /// Creates a reference image from a contiguous grayscale buffer.
    pub fn from_raw(
        name: impl Into<String>,
        data: Vec<u8>,
        width: usize,
        height: usize,
    ) -> EquipMatchResult<Self> {
        Ok(Self::new(name, OwnedImage::new(data, width, height)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category this template belongs to, recomputed from the name.
    pub fn category(&self) -> &str {
        category_of(&self.name)
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }

    pub fn view(&self) -> ImageView<'_, u8> {
        self.image.view()
    }

    pub fn plan(&self) -> &TemplatePlan {
        &self.plan
    }
}
