//! Minimal AVI (RIFF) writer for Motion JPEG.
//!
//! The file starts with a fixed 224 byte header (`hdrl` with one video
//! stream, then the `movi` list header). Frames are appended as `00dc`
//! chunks; `close` appends the `idx1` index and rewrites the header with
//! the final frame count and sizes.

use {
    crate::{RecordError, VideoSink},
    sentinel_base::Vec2,
    sentinel_image::{Frame, encode_jpeg},
    std::{
        fs::File,
        io::{self, Seek, SeekFrom, Write},
        path::{Path, PathBuf},
    },
};

const HEADER_SIZE: usize = 224;

// offset of the `movi` fourcc; idx1 offsets are relative to it
const MOVI_FOURCC_OFFSET: u32 = 220;

const AVIF_HASINDEX: u32 = 0x10;
const AVIIF_KEYFRAME: u32 = 0x10;

/// Seekable output of an `AviWriter`. A failed chunk write is rolled back
/// by truncating to the last complete chunk.
pub trait AviOutput: Write + Seek + Send {
    fn truncate(&mut self, len: u64) -> io::Result<()>;

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AviOutput for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

struct IndexEntry {
    offset: u32,
    size: u32,
}

pub struct AviWriter<W: AviOutput = File> {
    output: Option<W>,
    path: PathBuf,
    fps: u32,
    size: Vec2<usize>,
    quality: u8,
    index: Vec<IndexEntry>,
    movi_size: u32,
    max_chunk: u32,
}

impl AviWriter {
    /// Create `path` (truncating it) and write a placeholder header.
    pub fn create(
        path: &Path,
        fps: u32,
        size: Vec2<usize>,
        quality: u8,
    ) -> Result<Self, RecordError> {
        let file = File::create(path).map_err(|e| {
            RecordError::WriterInit(format!("cannot create {}: {}", path.display(), e))
        })?;
        Self::with_output(file, path, fps, size, quality)
    }
}

impl<W: AviOutput> AviWriter<W> {
    /// Start an AVI stream on `output`; `path` is only used for messages.
    pub fn with_output(
        mut output: W,
        path: &Path,
        fps: u32,
        size: Vec2<usize>,
        quality: u8,
    ) -> Result<Self, RecordError> {
        output
            .write_all(&header(fps, size, 0, 0, 4, 0))
            .map_err(|e| RecordError::WriterInit(e.to_string()))?;
        Ok(Self {
            output: Some(output),
            path: path.to_path_buf(),
            fps,
            size,
            quality,
            index: Vec::new(),
            movi_size: 4,
            max_chunk: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames(&self) -> usize {
        self.index.len()
    }

    // end of the last complete chunk
    fn committed_len(&self) -> u64 {
        HEADER_SIZE as u64 - 4 + self.movi_size as u64
    }

    // chunk size and movi size after appending `len` bytes of JPEG, if the
    // finished file still fits the 32 bit RIFF sizes
    fn grow(&self, len: usize) -> Option<(u32, u32)> {
        let size = u32::try_from(len).ok()?;
        let movi_size = self
            .movi_size
            .checked_add(8)?
            .checked_add(size)?
            .checked_add(size % 2)?;
        let frames = u32::try_from(self.index.len() + 1).ok()?;
        riff_size(movi_size, frames)?;
        Some((size, movi_size))
    }

    fn finish(&mut self, mut output: W) -> Result<(), RecordError> {
        let frames = u32::try_from(self.index.len()).map_err(|_| size_limit())?;
        let riff_size = riff_size(self.movi_size, frames).ok_or_else(size_limit)?;

        let mut idx1 = Vec::with_capacity(8 + self.index.len() * 16);
        put_chunk_header(&mut idx1, b"idx1", frames * 16);
        for entry in &self.index {
            idx1.extend_from_slice(b"00dc");
            put_u32(&mut idx1, AVIIF_KEYFRAME);
            put_u32(&mut idx1, entry.offset);
            put_u32(&mut idx1, entry.size);
        }
        output.write_all(&idx1)?;

        output.seek(SeekFrom::Start(0))?;
        output.write_all(&header(
            self.fps,
            self.size,
            frames,
            self.max_chunk,
            self.movi_size,
            riff_size,
        ))?;
        output.flush()?;
        output.sync()?;
        Ok(())
    }
}

impl<W: AviOutput> VideoSink for AviWriter<W> {
    fn write(&mut self, frame: &Frame) -> Result<(), RecordError> {
        if frame.size != self.size {
            return Err(RecordError::Write(format!(
                "frame is {}, stream is {}",
                frame.size, self.size
            )));
        }
        if self.output.is_none() {
            return Err(RecordError::Write("writer is closed".to_string()));
        }
        let jpeg = encode_jpeg(frame, self.quality)?;
        let (size, movi_size) = self.grow(jpeg.len()).ok_or_else(size_limit)?;

        let mut chunk = Vec::with_capacity(jpeg.len() + 9);
        put_chunk_header(&mut chunk, b"00dc", size);
        chunk.extend_from_slice(&jpeg);
        if size % 2 == 1 {
            chunk.push(0);
        }

        let committed = self.committed_len();
        let Some(output) = self.output.as_mut() else {
            return Err(RecordError::Write("writer is closed".to_string()));
        };
        if let Err(e) = output.write_all(&chunk) {
            let rewound = rewind(output, committed);
            if let Err(rewind_err) = rewound {
                // the file can no longer be trusted, stop accepting frames
                self.output = None;
                return Err(RecordError::Write(format!(
                    "{} (cannot roll back {}: {})",
                    e,
                    self.path.display(),
                    rewind_err
                )));
            }
            return Err(RecordError::Write(e.to_string()));
        }

        self.index.push(IndexEntry {
            offset: self.movi_size,
            size,
        });
        self.movi_size = movi_size;
        self.max_chunk = self.max_chunk.max(size);
        Ok(())
    }

    fn close(&mut self) -> Result<(), RecordError> {
        match self.output.take() {
            Some(output) => self.finish(output),
            None => Ok(()),
        }
    }
}

impl<W: AviOutput> Drop for AviWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("avi: failed to finalize {}: {}", self.path.display(), e);
        }
    }
}

fn rewind<W: AviOutput>(output: &mut W, len: u64) -> io::Result<()> {
    output.truncate(len)?;
    output.seek(SeekFrom::Start(len))?;
    Ok(())
}

fn size_limit() -> RecordError {
    RecordError::Write("AVI size limit reached".to_string())
}

// RIFF size field of a finished file: header, movi payload and idx1
fn riff_size(movi_size: u32, frames: u32) -> Option<u32> {
    let file_size = (HEADER_SIZE as u32 - 4)
        .checked_add(movi_size)?
        .checked_add(8)?
        .checked_add(frames.checked_mul(16)?)?;
    Some(file_size - 8)
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_chunk_header(buf: &mut Vec<u8>, fourcc: &[u8; 4], size: u32) {
    buf.extend_from_slice(fourcc);
    put_u32(buf, size);
}

// everything up to and including the `movi` fourcc
fn header(
    fps: u32,
    size: Vec2<usize>,
    frames: u32,
    max_chunk: u32,
    movi_size: u32,
    riff_size: u32,
) -> Vec<u8> {
    let (width, height) = (size.x as u32, size.y as u32);
    let fps = fps.max(1);
    let mut buf = Vec::with_capacity(HEADER_SIZE);

    put_chunk_header(&mut buf, b"RIFF", riff_size);
    buf.extend_from_slice(b"AVI ");

    put_chunk_header(&mut buf, b"LIST", 192);
    buf.extend_from_slice(b"hdrl");

    put_chunk_header(&mut buf, b"avih", 56);
    put_u32(&mut buf, 1_000_000 / fps); // dwMicroSecPerFrame
    put_u32(&mut buf, max_chunk.saturating_mul(fps)); // dwMaxBytesPerSec
    put_u32(&mut buf, 0); // dwPaddingGranularity
    put_u32(&mut buf, AVIF_HASINDEX);
    put_u32(&mut buf, frames);
    put_u32(&mut buf, 0); // dwInitialFrames
    put_u32(&mut buf, 1); // dwStreams
    put_u32(&mut buf, max_chunk); // dwSuggestedBufferSize
    put_u32(&mut buf, width);
    put_u32(&mut buf, height);
    buf.extend_from_slice(&[0; 16]);

    put_chunk_header(&mut buf, b"LIST", 116);
    buf.extend_from_slice(b"strl");

    put_chunk_header(&mut buf, b"strh", 56);
    buf.extend_from_slice(b"vids");
    buf.extend_from_slice(b"MJPG");
    put_u32(&mut buf, 0); // dwFlags
    put_u16(&mut buf, 0); // wPriority
    put_u16(&mut buf, 0); // wLanguage
    put_u32(&mut buf, 0); // dwInitialFrames
    put_u32(&mut buf, 1); // dwScale
    put_u32(&mut buf, fps); // dwRate
    put_u32(&mut buf, 0); // dwStart
    put_u32(&mut buf, frames); // dwLength
    put_u32(&mut buf, max_chunk); // dwSuggestedBufferSize
    put_u32(&mut buf, u32::MAX); // dwQuality
    put_u32(&mut buf, 0); // dwSampleSize
    put_u16(&mut buf, 0);
    put_u16(&mut buf, 0);
    put_u16(&mut buf, width as u16);
    put_u16(&mut buf, height as u16);

    put_chunk_header(&mut buf, b"strf", 40);
    put_u32(&mut buf, 40); // biSize
    put_u32(&mut buf, width);
    put_u32(&mut buf, height);
    put_u16(&mut buf, 1); // biPlanes
    put_u16(&mut buf, 24); // biBitCount
    buf.extend_from_slice(b"MJPG");
    put_u32(&mut buf, width * height * 3); // biSizeImage
    buf.extend_from_slice(&[0; 16]);

    put_chunk_header(&mut buf, b"LIST", movi_size);
    buf.extend_from_slice(b"movi");

    debug_assert_eq!(buf.len(), HEADER_SIZE);
    debug_assert_eq!(MOVI_FOURCC_OFFSET as usize, HEADER_SIZE - 4);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
    }

    #[test]
    fn test_header_layout() {
        let buf = header(20, Vec2::new(640, 480), 7, 1000, 4, 0);
        assert_eq!(buf.len(), HEADER_SIZE);
        assert_eq!(&buf[12..16], b"LIST");
        assert_eq!(&buf[20..24], b"hdrl");
        assert_eq!(&buf[24..28], b"avih");
        assert_eq!(u32_at(&buf, 32), 50_000);
        assert_eq!(u32_at(&buf, 48), 7);
        assert_eq!(u32_at(&buf, 64), 640);
        assert_eq!(&buf[88..92], b"LIST");
        assert_eq!(&buf[96..100], b"strl");
        assert_eq!(&buf[100..104], b"strh");
        assert_eq!(u32_at(&buf, 132), 20);
        assert_eq!(u32_at(&buf, 140), 7);
        assert_eq!(&buf[164..168], b"strf");
        assert_eq!(&buf[188..192], b"MJPG");
        assert_eq!(&buf[212..216], b"LIST");
        assert_eq!(&buf[220..224], b"movi");
    }

    #[test]
    fn test_riff_size_limits() {
        // header plus an empty idx1
        assert_eq!(riff_size(4, 0), Some(224));
        assert_eq!(riff_size(1004, 10), Some(224 + 1000 + 160));
        assert_eq!(riff_size(u32::MAX - 200, 1), None);
        assert_eq!(riff_size(4, u32::MAX / 8), None);
    }

    #[test]
    fn test_write_past_size_limit_is_rejected() {
        let path = std::env::temp_dir()
            .join(format!("sentinel-avi-limit-{}.avi", std::process::id()));
        let size = Vec2::new(16, 16);
        let mut writer = AviWriter::create(&path, 10, size, 80).unwrap();
        writer.movi_size = u32::MAX - 64;

        let err = writer.write(&Frame::solid(size, [10, 20, 30])).unwrap_err();
        assert!(err.to_string().contains("size limit"));
        assert_eq!(writer.frames(), 0);
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            HEADER_SIZE as u64
        );

        // finalize against the real payload
        writer.movi_size = 4;
        writer.close().unwrap();
        std::fs::remove_file(&path).ok();
    }
}
