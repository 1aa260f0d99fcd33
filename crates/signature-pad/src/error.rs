use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed data URL: {0}")]
    MalformedDataUrl(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PNG decoding failed: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("Cannot encode a zero-area surface ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },

    #[error("Pixel buffer of {actual} bytes does not match {width}x{height} RGBA")]
    BufferSize {
        width: u32,
        height: u32,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("Signature pad is not attached to a surface")]
    Detached,

    #[error(transparent)]
    Codec(#[from] CodecError),
}
