//! Integration tests for layouts, buffer exchange and matrices.

use pixio_core::{
    merge_channels, split_channels, BufferInfo, DynamicMatrix, Error, Image, ImageLayout,
    ImageRef, ImageView, LayoutDescriptor, Matrix3, PixelType,
};

const LAYOUTS: [(PixelType, ImageLayout); 7] = [
    (PixelType::Grayscale, ImageLayout::Planar),
    (PixelType::Rgb, ImageLayout::Planar),
    (PixelType::Rgba, ImageLayout::Interleaved),
    (PixelType::GrayAlpha, ImageLayout::Custom),
    (PixelType::BayerBggr, ImageLayout::Planar),
    (PixelType::Yuv, ImageLayout::Yuv420),
    (PixelType::Yuv, ImageLayout::Nv12),
];

#[test]
fn layout_strides_cover_every_plane() {
    for (pixel_type, layout) in LAYOUTS {
        for (w, h) in [(1, 1), (3, 5), (16, 9), (33, 17)] {
            for wa in [1, 2, 8, 64] {
                for ha in [1, 4] {
                    let desc = LayoutDescriptor::builder(w, h)
                        .pixel_type(pixel_type)
                        .image_layout(layout)
                        .width_alignment(wa)
                        .height_alignment(ha)
                        .size_alignment(32)
                        .build()
                        .unwrap();
                    for plane in desc.planes() {
                        assert!(
                            plane.row_stride >= plane.width * plane.pixel_stride,
                            "{pixel_type}/{layout} {w}x{h}: {plane:?}"
                        );
                        assert!(plane.end() <= desc.required_len());
                    }
                    assert_eq!(desc.required_len() % 32, 0);
                }
            }
        }
    }
}

#[test]
fn plane_counts_follow_layout() {
    let count = |pt, layout| {
        LayoutDescriptor::builder(8, 8)
            .pixel_type(pt)
            .image_layout(layout)
            .build()
            .unwrap()
            .num_planes()
    };
    assert_eq!(count(PixelType::Rgb, ImageLayout::Interleaved), 1);
    assert_eq!(count(PixelType::Rgba, ImageLayout::Planar), 4);
    assert_eq!(count(PixelType::Yuv, ImageLayout::Yuv420), 3);
    assert_eq!(count(PixelType::Yuv, ImageLayout::Nv12), 2);
    assert_eq!(count(PixelType::BayerRggb, ImageLayout::Planar), 1);
}

#[test]
fn yuv_exchange_shape_is_three_halves_height() {
    for layout in [ImageLayout::Yuv420, ImageLayout::Nv12] {
        for (w, h) in [(2, 2), (6, 4), (640, 480), (10, 100)] {
            let desc = LayoutDescriptor::builder(w, h)
                .pixel_type(PixelType::Yuv)
                .image_layout(layout)
                .build()
                .unwrap();
            let img: Image<u8> = Image::new(desc);
            let info = img.buffer_info().unwrap();
            assert_eq!(info.shape, vec![3 * h as usize / 2, w as usize]);

            let back = ImageRef::<u8>::from_buffer(&info, PixelType::Yuv, layout, 0).unwrap();
            assert_eq!((back.width(), back.height()), (w, h));
        }
    }
}

#[test]
fn yuv_odd_width_is_not_exchanged() {
    for layout in [ImageLayout::Yuv420, ImageLayout::Nv12] {
        let desc = LayoutDescriptor::builder(5, 4)
            .pixel_type(PixelType::Yuv)
            .image_layout(layout)
            .build()
            .unwrap();
        let img: Image<u8> = Image::new(desc);
        assert!(matches!(
            img.buffer_info(),
            Err(Error::IncompatibleBufferDimension(_))
        ));

        let dense = vec![0u8; 6 * 5];
        let info = BufferInfo::from_slice(&dense, vec![6, 5]);
        let err = ImageRef::<u8>::from_buffer(&info, PixelType::Yuv, layout, 0).unwrap_err();
        assert!(matches!(err, Error::IncompatibleBufferDimension(_)));
    }
}

#[test]
fn yuv_padding_rows_are_not_exchanged() {
    for layout in [ImageLayout::Yuv420, ImageLayout::Nv12] {
        // 6 rows stored as 8
        let desc = LayoutDescriptor::builder(4, 6)
            .pixel_type(PixelType::Yuv)
            .image_layout(layout)
            .height_alignment(4)
            .build()
            .unwrap();
        assert_eq!(desc.plane(1).offset, 4 * 8);
        let img: Image<u8> = Image::new(desc);
        assert!(matches!(
            img.buffer_info(),
            Err(Error::IncompatibleBufferDimension(_))
        ));
    }

    // 7 rows cannot be 3h/2 for any h
    let data = vec![0u8; 7 * 4];
    let info = BufferInfo::from_slice(&data, vec![7, 4]);
    let err = ImageRef::<u8>::from_buffer(&info, PixelType::Yuv, ImageLayout::Nv12, 0).unwrap_err();
    assert!(matches!(err, Error::IncompatibleBufferDimension(_)));
}

/// `100 * c + 10 * y + x` laid out as a C-contiguous `(h, w, ch)` array.
fn hwc_array(h: usize, w: usize, ch: usize) -> Vec<u16> {
    let mut data = Vec::with_capacity(h * w * ch);
    for y in 0..h {
        for x in 0..w {
            for c in 0..ch {
                data.push((100 * c + 10 * y + x) as u16);
            }
        }
    }
    data
}

#[test]
fn from_buffer_3d_indexes_like_the_array() {
    let (h, w, ch) = (2, 3, 3);
    let data = hwc_array(h, w, ch);
    let info = BufferInfo::from_slice(&data, vec![h, w, ch]);

    let img = ImageRef::<u16>::from_buffer(&info, PixelType::Rgb, ImageLayout::Interleaved, 0)
        .unwrap();
    for y in 0..h {
        for x in 0..w {
            for c in 0..ch {
                assert_eq!(img.get(x, y, c), data[(y * w + x) * ch + c]);
            }
        }
    }

    // the same bytes are not a planar image
    for layout in [ImageLayout::Planar, ImageLayout::Custom] {
        let err = ImageRef::<u16>::from_buffer(&info, PixelType::Rgb, layout, 0).unwrap_err();
        assert!(matches!(err, Error::IncompatibleFormat { .. }));
    }
}

#[test]
fn from_buffer_planar_strides() {
    let (h, w, ch) = (2, 3, 3);
    // plane c, row y, column x
    let planes: Vec<u16> = (0..ch)
        .flat_map(|c| (0..h).flat_map(move |y| (0..w).map(move |x| (100 * c + 10 * y + x) as u16)))
        .collect();
    let info = BufferInfo {
        data: bytemuck::cast_slice(&planes),
        item_size: 2,
        format: "H",
        shape: vec![h, w, ch],
        strides: vec![2 * w as isize, 2, 2 * (w * h) as isize],
    };

    let img = ImageRef::<u16>::from_buffer(&info, PixelType::Rgb, ImageLayout::Planar, 0).unwrap();
    assert_eq!(img.get(1, 0, 2), 201);
    assert_eq!(img.get(2, 1, 1), 112);
    for y in 0..h {
        for x in 0..w {
            for c in 0..ch {
                assert_eq!(img.get(x, y, c), (100 * c + 10 * y + x) as u16);
            }
        }
    }

    let err = ImageRef::<u16>::from_buffer(&info, PixelType::Rgb, ImageLayout::Interleaved, 0)
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleFormat { .. }));
}

#[test]
fn planar_export_imports_back() {
    let desc = LayoutDescriptor::builder(3, 2)
        .pixel_type(PixelType::Rgb)
        .image_layout(ImageLayout::Planar)
        .build()
        .unwrap();
    let data: Vec<f32> = (0..desc.required_len()).map(|v| v as f32).collect();
    let img = Image::from_vec(desc, data).unwrap();

    let info = img.buffer_info().unwrap();
    let back = ImageRef::<f32>::from_buffer(&info, PixelType::Rgb, ImageLayout::Planar, 0).unwrap();
    assert_eq!(back.to_image(), img);
}

#[test]
fn from_buffer_rejects_wrong_format() {
    let data = vec![0f32; 12];
    let info = BufferInfo::from_slice(&data, vec![3, 4]);
    let err = ImageRef::<u16>::from_buffer(&info, PixelType::Grayscale, ImageLayout::Planar, 0)
        .unwrap_err();
    assert_eq!(err, Error::incompatible_format("H", "f"));
}

#[test]
fn from_buffer_rejects_bad_rank() {
    let data = vec![0u16; 16];
    let info = BufferInfo::from_slice(&data, vec![2, 2, 2, 2]);
    let err = ImageRef::<u16>::from_buffer(&info, PixelType::Rgb, ImageLayout::Planar, 0)
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleBufferDimension(_)));

    let info = BufferInfo::from_slice(&data, vec![16]);
    let err = ImageRef::<u16>::from_buffer(&info, PixelType::Grayscale, ImageLayout::Planar, 0)
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleBufferDimension(_)));
}

#[test]
fn from_buffer_interleaved_roundtrip() {
    let data: Vec<u16> = (0..24).collect();
    let info = BufferInfo::from_slice(&data, vec![2, 4, 3]);
    let img = ImageRef::<u16>::from_buffer(&info, PixelType::Rgb, ImageLayout::Interleaved, 10)
        .unwrap();
    assert_eq!(img.pixel_precision(), 10);
    assert_eq!(img.get(1, 1, 2), 4 * 3 + 3 + 2);

    let out = img.buffer_info().unwrap();
    assert_eq!(out.shape, info.shape);
    assert_eq!(out.strides, info.strides);
    assert_eq!(out.data.as_ptr(), info.data.as_ptr());
}

#[test]
fn from_buffer_channel_axis_must_match() {
    let data = vec![0u8; 32];
    let info = BufferInfo::from_slice(&data, vec![2, 4, 4]);
    let err = ImageRef::<u8>::from_buffer(&info, PixelType::Rgb, ImageLayout::Interleaved, 0)
        .unwrap_err();
    assert!(matches!(err, Error::IncompatibleBufferDimension(_)));
}

#[test]
fn matrix3_serialize_roundtrip() {
    let values = [0.5, -1.0, 2.25, 3.0, 4.0, 5.5, -6.0, 7.0, 8.125];
    let m = Matrix3::new(values);
    let json = serde_json::to_value(m).unwrap();
    let rows: Vec<Vec<f32>> = serde_json::from_value(json.clone()).unwrap();
    assert_eq!(rows.len(), 3);
    for (r, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), 3);
        for (c, v) in row.iter().enumerate() {
            assert_eq!(*v, values[r * 3 + c]);
        }
    }
    let back: Matrix3 = serde_json::from_value(json).unwrap();
    assert_eq!(back, m);
}

#[test]
fn matrix3_rejects_wrong_shape_json() {
    let bad = serde_json::json!([[1.0, 2.0], [3.0, 4.0]]);
    assert!(serde_json::from_value::<Matrix3>(bad).is_err());
}

#[test]
fn matrix_buffer_strides() {
    let m = DynamicMatrix::filled(3, 7, 1.0).unwrap();
    assert_eq!(m.buffer_info().strides, vec![28, 4]);
    approx::assert_relative_eq!(m.get(2, 6), 1.0);
}

#[test]
fn bayer_split_merge_is_lossless() {
    for pixel_type in [
        PixelType::BayerRggb,
        PixelType::BayerBggr,
        PixelType::BayerGrbg,
        PixelType::BayerGbrg,
    ] {
        let desc = LayoutDescriptor::builder(6, 4)
            .pixel_type(pixel_type)
            .width_alignment(8)
            .pixel_precision(12)
            .build()
            .unwrap();
        let mut img: Image<u16> = Image::new(desc.clone());
        for y in 0..4 {
            for x in 0..6 {
                img.set(x, y, 0, (y * 100 + x) as u16);
            }
        }
        let parts = split_channels(&img.view()).unwrap();
        let views: Vec<_> = parts.iter().map(|(n, p)| (*n, p.view())).collect();
        let merged = merge_channels(&views, desc).unwrap();
        assert_eq!(merged, img);
    }
}

#[test]
fn rgb_split_merge_changes_layout() {
    let planar = LayoutDescriptor::builder(3, 2)
        .pixel_type(PixelType::Rgb)
        .build()
        .unwrap();
    let data: Vec<f32> = (0..18).map(|v| v as f32).collect();
    let img = ImageRef::new(planar, &data).unwrap();
    let parts = split_channels(&img).unwrap();
    let views: Vec<_> = parts.iter().map(|(n, p)| (*n, p.view())).collect();

    let interleaved = LayoutDescriptor::builder(3, 2)
        .pixel_type(PixelType::Rgb)
        .image_layout(ImageLayout::Interleaved)
        .build()
        .unwrap();
    let merged = merge_channels(&views, interleaved).unwrap();
    assert_eq!(merged.get(2, 1, 0), img.get(2, 1, 0));
    assert_eq!(merged.get(0, 1, 2), img.get(0, 1, 2));
    assert_eq!(merged.data()[0..3], [0.0, 6.0, 12.0]);
}
