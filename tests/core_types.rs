use inspectvision::{ErrorKind, Frame, FrameView, InspectError, Region};

#[test]
fn frame_view_rejects_invalid_dimensions() {
    let data = [0.0f32; 12];

    let err = FrameView::from_slice(&data, 0, 1).err().unwrap();
    assert!(matches!(
        err,
        InspectError::InvalidDimensions {
            width: 0,
            height: 1
        }
    ));

    let err = FrameView::from_slice(&data, 1, 0).err().unwrap();
    assert!(matches!(
        err,
        InspectError::InvalidDimensions {
            width: 1,
            height: 0
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn frame_view_rejects_invalid_stride_and_small_buffer() {
    let data = [0.0f32; 24];
    let err = FrameView::new(&data, 4, 1, 3).err().unwrap();
    assert!(matches!(
        err,
        InspectError::InvalidStride {
            width: 4,
            stride: 3
        }
    ));

    let data = [0.0f32; 9];
    let err = FrameView::new(&data, 2, 2, 2).err().unwrap();
    assert!(matches!(
        err,
        InspectError::BufferTooSmall { needed: 12, got: 9 }
    ));
}

#[test]
fn crop_is_zero_copy_and_bounds_checked() {
    let frame = Frame::from_fn(4, 4, |x, y| [x as f32, y as f32, (x + 4 * y) as f32]);
    let view = frame.view();
    let roi = view.crop(Region::new(1, 2, 2, 2)).unwrap();
    assert_eq!(roi.shape(), (2, 2));
    assert_eq!(roi.stride(), 4);
    assert_eq!(roi.pixel(0, 0), Some([1.0, 2.0, 9.0]));
    assert_eq!(roi.pixel(1, 1), Some([2.0, 3.0, 14.0]));
    assert_eq!(roi.row(1).unwrap(), &[1.0, 3.0, 13.0, 2.0, 3.0, 14.0]);
    assert!(roi.pixel(2, 0).is_none());

    let owned = roi.to_frame();
    assert_eq!(owned.width(), 2);
    assert_eq!(owned.data().len(), 12);
    assert_eq!(owned.pixel(1, 0), Some([2.0, 2.0, 10.0]));

    let err = view.crop(Region::new(3, 3, 2, 2)).err().unwrap();
    assert!(matches!(
        err,
        InspectError::RegionOutOfBounds {
            x: 3,
            y: 3,
            width: 2,
            height: 2,
            img_width: 4,
            img_height: 4,
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[test]
fn region_translation_keeps_size() {
    let region = Region::new(4, 6, 10, 3);
    let moved = region.translated(-2, 2).unwrap();
    assert_eq!(moved.origin(), (2, 8));
    assert_eq!(moved.size(), (10, 3));
    assert!(region.translated(-5, 0).is_none());
    assert!(region.fits_within(14, 9));
    assert!(!region.fits_within(13, 9));
}

#[test]
fn frame_new_checks_buffer_length() {
    assert!(Frame::new(vec![0.0; 12], 2, 2).is_ok());
    let err = Frame::new(vec![0.0; 11], 2, 2).err().unwrap();
    assert!(matches!(
        err,
        InspectError::BufferTooSmall { needed: 12, got: 11 }
    ));
}
