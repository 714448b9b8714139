use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub jpeg: Vec<u8>,
}

pub fn encode_snapshot(frame: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100));
    encoder
        .encode_image(frame)
        .context("failed to encode webcam snapshot as jpeg")?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::encode_snapshot;
    use image::{Rgb, RgbImage};

    #[test]
    fn encodes_a_jpeg() {
        let frame = RgbImage::from_pixel(16, 16, Rgb([200, 40, 40]));
        let jpeg = encode_snapshot(&frame, 80).expect("encode");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg)
            .expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }
}
