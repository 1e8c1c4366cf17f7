use super::*;

fn gradient_rgba(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            out.extend_from_slice(&[x as u8, y as u8, ((x + y) % 256) as u8, 255]);
        }
    }
    out
}

#[test]
fn webp_roundtrip_is_lossless() {
    let codec = ImageRsCodec;
    let raw = gradient_rgba(7, 5);
    let webp = codec.raw_to_webp(&raw, 7, 5).unwrap();
    assert_eq!(codec.webp_to_raw(&webp, 7, 5).unwrap(), raw);
}

#[test]
fn webp_roundtrip_preserves_partial_alpha() {
    let codec = ImageRsCodec;
    let raw = vec![10, 20, 30, 0, 40, 50, 60, 128, 70, 80, 90, 255, 1, 2, 3, 4];
    let webp = codec.raw_to_webp(&raw, 4, 1).unwrap();
    assert_eq!(codec.webp_to_raw(&webp, 4, 1).unwrap(), raw);
}

#[test]
fn webp_decode_rejects_dimension_mismatch() {
    let codec = ImageRsCodec;
    let webp = codec.raw_to_webp(&gradient_rgba(4, 4), 4, 4).unwrap();
    let err = codec.webp_to_raw(&webp, 5, 4).unwrap_err();
    assert!(matches!(err, AnvilError::Decode(_)));
}

#[test]
fn webp_decode_rejects_garbage() {
    let codec = ImageRsCodec;
    let err = codec.webp_to_raw(b"not a webp stream", 2, 2).unwrap_err();
    assert!(matches!(err, AnvilError::Decode(_)));
}

#[test]
fn png_roundtrip_is_lossless() {
    let codec = ImageRsCodec;
    let raw = gradient_rgba(6, 3);
    let png = codec.raw_to_png(&raw, 6, 3).unwrap();
    assert_eq!(codec.png_to_raw(&png, 6, 3).unwrap(), raw);
}

#[test]
fn png_decode_rejects_dimension_mismatch() {
    let codec = ImageRsCodec;
    let png = codec.raw_to_png(&gradient_rgba(4, 4), 4, 4).unwrap();
    let err = codec.png_to_raw(&png, 4, 3).unwrap_err();
    assert!(matches!(err, AnvilError::Decode(_)));
}

#[test]
fn encode_rejects_short_payload() {
    let codec = ImageRsCodec;
    let err = codec.raw_to_webp(&[0u8; 8], 2, 2).unwrap_err();
    assert!(matches!(err, AnvilError::BufferSizeMismatch { expected: 16, actual: 8 }));
    let err = codec.raw_to_png(&[0u8; 8], 2, 2).unwrap_err();
    assert!(matches!(err, AnvilError::BufferSizeMismatch { expected: 16, actual: 8 }));
}
