use image::{ImageBuffer, Rgb};

pub type ViewImage = ImageBuffer<Rgb<u8>, Vec<u8>>;
