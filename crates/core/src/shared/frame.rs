use image::RgbImage;
use ndarray::{ArrayView3, ArrayViewMut3};

/// A single video/image frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only. Composition reads and
/// writes pixels through the `(row, col, channel)` ndarray views.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub const CHANNELS: u8 = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS as usize,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// A black frame of the given size.
    pub fn blank(width: u32, height: u32, index: usize) -> Self {
        let len = (width as usize) * (height as usize) * Self::CHANNELS as usize;
        Self::new(vec![0; len], width, height, index)
    }

    pub fn from_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, index)
    }

    pub fn into_image(self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        Self::CHANNELS
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let offset = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            Self::CHANNELS as usize,
        )
    }
}
