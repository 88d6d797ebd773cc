use sentinel_camera::CameraError;
use sentinel_image::ImageError;
use std::io;

#[test]
fn test_from_io_error() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "device not found");
    let cam_err: CameraError = io_err.into();

    match cam_err {
        CameraError::DeviceUnavailable(msg) => assert!(msg.contains("device not found")),
        _ => panic!("Expected CameraError::DeviceUnavailable variant"),
    }
}

#[test]
fn test_from_image_error() {
    let img_err = ImageError::Decode("invalid JPEG".to_string());
    let cam_err: CameraError = img_err.into();

    match cam_err {
        CameraError::Decode(_) => {}
        _ => panic!("Expected CameraError::Decode variant"),
    }
}

#[test]
fn test_error_display() {
    let device_err = CameraError::DeviceUnavailable("no /dev/video0".to_string());
    assert!(device_err.to_string().contains("no /dev/video0"));

    let read_err = CameraError::ReadFailure("timeout".to_string());
    assert!(read_err.to_string().contains("timeout"));
}
