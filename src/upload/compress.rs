use bytes::Bytes;

/// Image compression hook supplied by the caller / 图片压缩
///
/// Returning `None` means "nothing produced" and the original payload is sent.
pub trait ImageCompressor: Send + Sync {
    fn compress(&self, data: &[u8], mime: &str) -> Option<Bytes>;

    /// When false, uploaders skip reading files into memory for compression
    fn is_enabled(&self) -> bool {
        true
    }
}

/// No compression / 不压缩
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompressor;

impl ImageCompressor for NoopCompressor {
    fn compress(&self, _data: &[u8], _mime: &str) -> Option<Bytes> {
        None
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

impl<F> ImageCompressor for F
where
    F: Fn(&[u8], &str) -> Option<Bytes> + Send + Sync,
{
    fn compress(&self, data: &[u8], mime: &str) -> Option<Bytes> {
        self(data, mime)
    }
}
