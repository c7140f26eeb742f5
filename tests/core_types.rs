use featmatch::{Channels, FeatMatchError, ImageView, Plane, Raster, Rgb};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0.0f32; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        FeatMatchError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        FeatMatchError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        FeatMatchError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, FeatMatchError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn image_view_roi_matches_expected_values() {
    let data: Vec<u8> = (0u8..16).collect();
    let view = ImageView::from_slice(&data, 4, 4).unwrap();

    let roi = view.roi(1, 1, 2, 2).unwrap();
    assert_eq!((roi.width(), roi.height(), roi.stride()), (2, 2, 4));
    assert_eq!(roi.row(0).unwrap(), &[5u8, 6u8]);
    assert_eq!(roi.row(1).unwrap(), &[9u8, 10u8]);
    assert_eq!(roi.get(0, 0).copied(), Some(5u8));
    assert!(roi.get(2, 0).is_none());

    let err = view.roi(3, 3, 2, 2).err().unwrap();
    assert_eq!(
        err,
        FeatMatchError::RoiOutOfBounds {
            x: 3,
            y: 3,
            width: 2,
            height: 2,
            img_width: 4,
            img_height: 4,
        }
    );
}

#[test]
fn raster_validates_buffer_length() {
    let err = Raster::rgb(vec![0u8; 11], 2, 2).unwrap_err();
    assert_eq!(err, FeatMatchError::BufferTooSmall { needed: 12, got: 11 });

    let err = Raster::gray(vec![0u8; 5], 2, 2).unwrap_err();
    assert_eq!(
        err,
        FeatMatchError::InvalidDimensions {
            width: 2,
            height: 2,
        }
    );

    assert_eq!(
        Channels::from_count(4).unwrap_err(),
        FeatMatchError::UnsupportedChannels { got: 4 }
    );
}

#[test]
fn raster_to_gray_uses_luma_weights() {
    let raster = Raster::rgb(vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 10, 10, 10], 4, 1).unwrap();
    let gray = raster.to_gray();
    let expected = [0.299 * 255.0, 0.587 * 255.0, 0.114 * 255.0, 10.0];
    for (got, want) in gray.data().iter().zip(expected) {
        assert!((got - want).abs() < 1e-3, "got {got}, want {want}");
    }
}

#[test]
fn empty_raster_is_absent() {
    let raster = Raster::empty();
    assert!(raster.is_empty());
    assert!(raster.to_gray().is_empty());
    assert!(Raster::filled(0, 5, Channels::Rgb, 0).is_empty());
}

#[test]
fn put_pixel_clips_and_converts() {
    let mut gray = Raster::filled(3, 3, Channels::Gray, 0);
    gray.put_pixel(-1, 0, Rgb::RED);
    gray.put_pixel(3, 3, Rgb::RED);
    assert!(gray.data().iter().all(|&v| v == 0));

    gray.put_pixel(1, 1, Rgb(255, 255, 255));
    assert_eq!(gray.pixel(1, 1), Some(&[255u8][..]));

    let rgb = gray.to_rgb();
    assert_eq!(rgb.channels(), Channels::Rgb);
    assert_eq!(rgb.pixel(1, 1), Some(&[255u8, 255, 255][..]));
}

#[test]
fn blit_rejects_channel_mismatch() {
    let mut canvas = Raster::filled(4, 4, Channels::Rgb, 0);
    let gray = Raster::filled(2, 2, Channels::Gray, 9);
    assert_eq!(
        canvas.blit(&gray, 0, 0).unwrap_err(),
        FeatMatchError::ChannelMismatch {
            expected: 3,
            got: 1,
        }
    );
}

#[test]
fn plane_accessors() {
    let plane = Plane::new(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2).unwrap();
    assert_eq!(plane.row(1), &[4.0, 5.0, 6.0]);
    assert_eq!(plane.get(2, 0), Some(3.0));
    assert_eq!(plane.get(3, 0), None);
    assert_eq!(plane.max_value(), Some(6.0));
    assert_eq!(
        Plane::new(vec![0.0f32; 5], 3, 2).unwrap_err(),
        FeatMatchError::BufferTooSmall { needed: 6, got: 5 }
    );
}

#[test]
fn plane_from_view_copies_roi_rows() {
    let plane = Plane::new((0..12).map(|v| v as f32).collect(), 4, 3).unwrap();
    let roi = plane.view().roi(1, 1, 2, 2).unwrap();
    let copy = Plane::from_view(roi);
    assert_eq!((copy.width(), copy.height()), (2, 2));
    assert_eq!(copy.data(), &[5.0, 6.0, 9.0, 10.0]);
}
