use crate::fetcher::{FetchedImage, ImageId};
use crate::PagerError;

/// Images shown so far in a search session, plus the caller's selection
///
/// Indices are gallery positions in render order. The selection keeps the
/// order in which images were picked.
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    images: Vec<FetchedImage>,
    selected: Vec<usize>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly rendered images
    pub fn extend(&mut self, images: impl IntoIterator<Item = FetchedImage>) {
        self.images.extend(images);
    }

    /// Adds `index` to the selection unless it is already there
    pub fn select(&mut self, index: usize) -> Result<(), PagerError> {
        self.check_index(index)?;
        if !self.selected.contains(&index) {
            self.selected.push(index);
        }
        Ok(())
    }

    /// Flips the selection of the image at `index` and returns whether it is
    /// now selected
    pub fn toggle(&mut self, index: usize) -> Result<bool, PagerError> {
        self.check_index(index)?;

        if let Some(pos) = self.selected.iter().position(|&i| i == index) {
            self.selected.remove(pos);
            Ok(false)
        } else {
            self.selected.push(index);
            Ok(true)
        }
    }

    fn check_index(&self, index: usize) -> Result<(), PagerError> {
        if index >= self.images.len() {
            return Err(PagerError::InvalidSelection {
                index,
                len: self.images.len(),
            });
        }
        Ok(())
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Selected indices in pick order
    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn get(&self, index: usize) -> Option<&FetchedImage> {
        self.images.get(index)
    }

    pub fn images(&self) -> &[FetchedImage] {
        &self.images
    }

    /// Ids of every image in gallery order
    pub fn ids(&self) -> Vec<ImageId> {
        self.images.iter().map(|image| image.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
