use {
    crate::{CameraConfig, CameraError, CaptureDevice},
    sentinel_base::Vec2,
    sentinel_image::{Frame, decode_jpeg, yuyv_to_rgb},
    v4l::{
        Device, Format, FourCC, buffer::Type, io::mmap::Stream as MmapStream,
        io::traits::CaptureStream, video::Capture,
    },
};

// number of mmap buffers in the capture stream
const BUFFER_COUNT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireFormat {
    Yuyv,
    Mjpg,
}

/// Video4Linux2 capture device. Prefers YUYV and falls back to MJPEG when
/// the driver picks it; both are converted to RGB frames.
pub struct V4l2 {
    stream: Option<MmapStream<'static>>,
    size: Vec2<usize>,
    format: WireFormat,
}

impl V4l2 {
    pub fn new() -> Self {
        Self {
            stream: None,
            size: Vec2::zero(),
            format: WireFormat::Yuyv,
        }
    }
}

impl Default for V4l2 {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for V4l2 {
    fn open(&mut self, config: &CameraConfig) -> Result<CameraConfig, CameraError> {
        // close stream
        self.stream.take();

        // create device from path or index
        let device = match config.device_path() {
            Some(path) => Device::with_path(path)?,
            None => Device::new(config.device_index())?,
        };

        // set the format and get the actual format back
        let actual_format = Capture::set_format(
            &device,
            &Format::new(
                config.width() as u32,
                config.height() as u32,
                FourCC::new(b"YUYV"),
            ),
        )?;
        self.size = Vec2::new(actual_format.width as usize, actual_format.height as usize);
        self.format = match &actual_format.fourcc.repr {
            b"YUYV" => WireFormat::Yuyv,
            b"MJPG" => WireFormat::Mjpg,
            _ => {
                return Err(CameraError::DeviceUnavailable(format!(
                    "unsupported pixel format: {}",
                    actual_format.fourcc
                )));
            }
        };

        // set the frame rate and get the actual frame rate back
        let actual_params = Capture::set_params(
            &device,
            &v4l::video::capture::Parameters::with_fps(config.fps()),
        )?;
        let fps = actual_params.interval.denominator / actual_params.interval.numerator.max(1);

        self.stream = Some(
            MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)
                .map_err(|e| CameraError::DeviceUnavailable(e.to_string()))?,
        );

        log::debug!(
            "v4l2: opened {} as {:?} at {} fps",
            self.size,
            self.format,
            fps
        );

        Ok(config.clone().with_size(self.size).with_fps(fps))
    }

    fn close(&mut self) {
        self.stream.take();
    }

    fn blocking_capture(&mut self) -> Result<Frame, CameraError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(CameraError::ReadFailure("no stream".to_string()));
        };
        let (data, _metadata) = CaptureStream::next(stream)
            .map_err(|e| CameraError::ReadFailure(e.to_string()))?;
        let frame = match self.format {
            WireFormat::Yuyv => yuyv_to_rgb(self.size, data)?,
            WireFormat::Mjpg => decode_jpeg(data)?,
        };
        Ok(frame)
    }
}
