use {crate::RecordError, std::fmt, std::str::FromStr};

/// Four-character video codec tag, e.g. `mp4v` or `MJPG`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// MPEG-4 Part 2 in an MP4 container.
    pub const MP4V: FourCc = FourCc(*b"mp4v");
    /// H.264 in an MP4 container.
    pub const AVC1: FourCc = FourCc(*b"avc1");
    /// Motion JPEG in an AVI container.
    pub const MJPG: FourCc = FourCc(*b"MJPG");

    pub fn new(tag: &[u8; 4]) -> Self {
        FourCc(*tag)
    }

    pub fn is_mjpeg(&self) -> bool {
        self.0.eq_ignore_ascii_case(b"MJPG")
    }

    /// File extension of the container this codec is written into.
    pub fn extension(&self) -> &'static str {
        if self.is_mjpeg() { "avi" } else { "mp4" }
    }

    /// Name of the ffmpeg encoder for this codec, if there is one.
    pub fn ffmpeg_encoder(&self) -> Option<&'static str> {
        let mut tag = self.0;
        tag.make_ascii_lowercase();
        match &tag {
            b"mp4v" | b"fmp4" | b"xvid" => Some("mpeg4"),
            b"avc1" | b"h264" | b"x264" => Some("libx264"),
            b"mjpg" => Some("mjpeg"),
            _ => None,
        }
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({})", self)
    }
}

impl FromStr for FourCc {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
            return Err(RecordError::WriterInit(format!(
                "invalid codec tag {:?}, expected four ASCII characters",
                s
            )));
        }
        Ok(FourCc([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
