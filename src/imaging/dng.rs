//! Minimal DNG writer for RAW_SENSOR captures.
//!
//! A DNG is a little-endian TIFF with a single IFD describing a CFA
//! (color filter array) sensor plane. Only the tags a DNG reader needs to
//! open the file are written:
//!
//! | Tag | Name | Value |
//! |---|---|---|
//! | 254 | NewSubfileType | 0 (main image) |
//! | 256/257 | ImageWidth / ImageLength | sensor size |
//! | 258 | BitsPerSample | 16 |
//! | 259 | Compression | 1 (none) |
//! | 262 | PhotometricInterpretation | 32803 (CFA) |
//! | 271/272 | Make / Model | from `{TIFF}` metadata, when present |
//! | 273/279 | StripOffsets / StripByteCounts | one strip |
//! | 274 | Orientation | capture EXIF tag |
//! | 33421/33422 | CFARepeatPatternDim / CFAPattern | 2x2 Bayer |
//! | 50706/50707 | DNGVersion / DNGBackwardVersion | 1.4 / 1.1 |
//! | 50714/50717 | BlackLevel / WhiteLevel | sensor levels |
//! | 50721 | ColorMatrix1 | identity |
//! | 50728 | AsShotNeutral | 1, 1, 1 |
//!
//! Sensor samples are 16-bit little-endian, as delivered by RAW_SENSOR
//! planes. Rows are repacked when the plane has row padding.

use crate::types::{CfaPattern, RawSensorInfo};

const TIFF_HEADER_LEN: u32 = 8;
const IFD_ENTRY_LEN: u32 = 12;
const BYTES_PER_SAMPLE: u32 = 2;

const SOFTWARE: &str = concat!("photo-finish ", env!("CARGO_PKG_VERSION"));

// TIFF field types
const BYTE: u16 = 1;
const ASCII: u16 = 2;
const SHORT: u16 = 3;
const LONG: u16 = 4;
const RATIONAL: u16 = 5;
const SRATIONAL: u16 = 10;

/// A validated view of a RAW sensor plane.
#[derive(Debug)]
pub struct SensorPlane<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    row_stride: u32,
}

impl<'a> SensorPlane<'a> {
    /// Validate that `data` holds `height` rows of `width` 16-bit samples.
    ///
    /// `row_stride` is in bytes and defaults to a tightly packed row.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        row_stride: Option<u32>,
    ) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err(format!("sensor plane has no pixels ({width}x{height})"));
        }
        let row_len = width
            .checked_mul(BYTES_PER_SAMPLE)
            .ok_or_else(|| format!("sensor width {width} overflows"))?;
        let row_stride = row_stride.unwrap_or(row_len);
        if row_stride < row_len {
            return Err(format!(
                "row stride {row_stride} is shorter than a {width}-sample row"
            ));
        }
        let required = (row_stride as u64) * (height as u64 - 1) + row_len as u64;
        if (data.len() as u64) < required {
            return Err(format!(
                "sensor plane holds {} bytes, {width}x{height} needs {required}",
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            row_stride,
        })
    }

    fn row_len(&self) -> usize {
        (self.width * BYTES_PER_SAMPLE) as usize
    }

    fn strip_len(&self) -> u32 {
        self.width * BYTES_PER_SAMPLE * self.height
    }

    fn write_rows(&self, out: &mut Vec<u8>) {
        let row_len = self.row_len();
        if self.row_stride as usize == row_len {
            out.extend_from_slice(&self.data[..row_len * self.height as usize]);
            return;
        }
        for row in 0..self.height as usize {
            let start = row * self.row_stride as usize;
            out.extend_from_slice(&self.data[start..start + row_len]);
        }
    }
}

/// Descriptive fields that accompany the sensor plane.
#[derive(Debug, Clone, Default)]
pub struct DngDescription<'a> {
    pub make: Option<&'a str>,
    pub model: Option<&'a str>,
    /// EXIF orientation tag, written as-is when in 1..=8.
    pub orientation: u32,
    pub sensor: RawSensorInfo,
}

/// One IFD entry before layout.
struct Entry {
    tag: u16,
    field_type: u16,
    count: u32,
    payload: Vec<u8>,
}

impl Entry {
    fn shorts(tag: u16, values: &[u16]) -> Self {
        Self {
            tag,
            field_type: SHORT,
            count: values.len() as u32,
            payload: values.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    fn long(tag: u16, value: u32) -> Self {
        Self {
            tag,
            field_type: LONG,
            count: 1,
            payload: value.to_le_bytes().to_vec(),
        }
    }

    fn bytes(tag: u16, values: &[u8]) -> Self {
        Self {
            tag,
            field_type: BYTE,
            count: values.len() as u32,
            payload: values.to_vec(),
        }
    }

    fn ascii(tag: u16, value: &str) -> Self {
        let mut payload = value.as_bytes().to_vec();
        payload.push(0);
        Self {
            tag,
            field_type: ASCII,
            count: payload.len() as u32,
            payload,
        }
    }

    fn rationals(tag: u16, field_type: u16, values: &[(i32, i32)]) -> Self {
        Self {
            tag,
            field_type,
            count: values.len() as u32,
            payload: values
                .iter()
                .flat_map(|(n, d)| n.to_le_bytes().into_iter().chain(d.to_le_bytes()))
                .collect(),
        }
    }
}

fn cfa_code(pattern: CfaPattern) -> [u8; 4] {
    // 0 = red, 1 = green, 2 = blue, row-major over the 2x2 tile
    match pattern {
        CfaPattern::Rggb => [0, 1, 1, 2],
        CfaPattern::Grbg => [1, 0, 2, 1],
        CfaPattern::Gbrg => [1, 2, 0, 1],
        CfaPattern::Bggr => [2, 1, 1, 0],
    }
}

/// Encode a sensor plane as a complete DNG file.
pub fn encode_dng(plane: &SensorPlane<'_>, description: &DngDescription<'_>) -> Vec<u8> {
    let orientation = match description.orientation {
        tag @ 1..=8 => tag as u16,
        _ => 1,
    };
    let camera_model = match (description.make, description.model) {
        (Some(make), Some(model)) => format!("{make} {model}"),
        (None, Some(model)) => model.to_string(),
        (Some(make), None) => make.to_string(),
        (None, None) => "Unknown Camera".to_string(),
    };

    // StripOffsets is patched once the layout is known.
    let mut entries = vec![
        Entry::long(254, 0),
        Entry::long(256, plane.width),
        Entry::long(257, plane.height),
        Entry::shorts(258, &[16]),
        Entry::shorts(259, &[1]),
        Entry::shorts(262, &[32803]),
    ];
    if let Some(make) = description.make {
        entries.push(Entry::ascii(271, make));
    }
    if let Some(model) = description.model {
        entries.push(Entry::ascii(272, model));
    }
    entries.extend([
        Entry::long(273, 0),
        Entry::shorts(274, &[orientation]),
        Entry::shorts(277, &[1]),
        Entry::long(278, plane.height),
        Entry::long(279, plane.strip_len()),
        Entry::shorts(284, &[1]),
        Entry::ascii(305, SOFTWARE),
        Entry::shorts(33421, &[2, 2]),
        Entry::bytes(33422, &cfa_code(description.sensor.cfa_pattern)),
        Entry::bytes(50706, &[1, 4, 0, 0]),
        Entry::bytes(50707, &[1, 1, 0, 0]),
        Entry::ascii(50708, &camera_model),
        Entry::long(50714, description.sensor.black_level),
        Entry::long(50717, description.sensor.white_level),
        Entry::rationals(
            50721,
            SRATIONAL,
            &[(1, 1), (0, 1), (0, 1), (0, 1), (1, 1), (0, 1), (0, 1), (0, 1), (1, 1)],
        ),
        Entry::rationals(50728, RATIONAL, &[(1, 1), (1, 1), (1, 1)]),
    ]);

    let ifd_len = 2 + entries.len() as u32 * IFD_ENTRY_LEN + 4;
    let data_start = TIFF_HEADER_LEN + ifd_len;
    let overflow_len: u32 = entries
        .iter()
        .filter(|e| e.payload.len() > 4)
        .map(|e| (e.payload.len() as u32).next_multiple_of(2))
        .sum();
    let strip_offset = data_start + overflow_len;

    if let Some(strip) = entries.iter_mut().find(|e| e.tag == 273) {
        strip.payload = strip_offset.to_le_bytes().to_vec();
    }

    let mut out = Vec::with_capacity((strip_offset + plane.strip_len()) as usize);
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&TIFF_HEADER_LEN.to_le_bytes());

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    let mut overflow = Vec::with_capacity(overflow_len as usize);
    for entry in &entries {
        out.extend_from_slice(&entry.tag.to_le_bytes());
        out.extend_from_slice(&entry.field_type.to_le_bytes());
        out.extend_from_slice(&entry.count.to_le_bytes());
        if entry.payload.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..entry.payload.len()].copy_from_slice(&entry.payload);
            out.extend_from_slice(&inline);
        } else {
            let offset = data_start + overflow.len() as u32;
            out.extend_from_slice(&offset.to_le_bytes());
            overflow.extend_from_slice(&entry.payload);
            if overflow.len() % 2 == 1 {
                overflow.push(0);
            }
        }
    }
    // No further IFDs
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&overflow);

    plane.write_rows(&mut out);
    out
}
