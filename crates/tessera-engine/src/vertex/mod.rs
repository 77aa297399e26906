//! Fixed-layout GPU vertex record and its serialization contract.
//!
//! One record is 36 bytes: position (3×f32), color (4×u8), texture
//! coordinates (2×u16, normalized), flag bytes (4×u8), normal (3×f32).
//! Texture coordinates are stored scaled into the full unsigned-16-bit range
//! to halve their footprint versus floats; consumers reverse the scale when
//! sampling. Serialization is explicitly little-endian so the buffer layout
//! is identical on every platform.

use bytemuck::{Pod, Zeroable};

/// Byte size of one serialized [`VertexRecord`].
pub const RECORD_SIZE: usize = 36;

/// Flag byte indices within [`VertexRecord::flags`].
pub const FLAG_TEXTURED: usize = 0;
/// Texture array layer selector.
pub const FLAG_TEXTURE_LAYER: usize = 1;
pub const FLAG_LIT: usize = 2;

/// One GPU vertex.
///
/// Created per render submission, serialized once, then discarded; static
/// submissions are the caller's concern (keep a separate long-lived batch).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct VertexRecord {
    pub position: [f32; 3],
    /// RGBA, 0..255.
    pub color: [u8; 4],
    /// Normalized texture coordinates scaled by 65535.
    pub uv: [u16; 2],
    /// `[textured, texture layer, lit, spare]`.
    pub flags: [u8; 4],
    pub normal: [f32; 3],
}

impl Default for VertexRecord {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            color: [255; 4],
            uv: [0; 2],
            flags: [0; 4],
            normal: [0.0, 0.0, 1.0],
        }
    }
}

impl VertexRecord {
    #[inline]
    pub fn new(position: [f32; 3]) -> Self {
        Self { position, ..Self::default() }
    }

    #[inline]
    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    /// Stores normalized texture coordinates, scaled into the u16 range.
    ///
    /// Inputs are clamped to `[0, 1]`; the stored value is
    /// `round(v * 65535)`.
    #[inline]
    pub fn set_uv(&mut self, u: f32, v: f32) {
        self.uv = [scale_uv(u), scale_uv(v)];
    }

    #[inline]
    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.set_uv(u, v);
        self
    }

    /// Marks the vertex textured from the given texture array layer.
    #[inline]
    pub fn with_texture_layer(mut self, layer: u8) -> Self {
        self.flags[FLAG_TEXTURED] = 1;
        self.flags[FLAG_TEXTURE_LAYER] = layer;
        self
    }

    /// Writes this record at byte offset `RECORD_SIZE * index`.
    ///
    /// Multi-byte fields are encoded little-endian; 8-bit fields are written
    /// directly.
    ///
    /// # Panics
    /// Panics if `buf` does not cover the record's byte range.
    pub fn encode_into(&self, buf: &mut [u8], index: usize) {
        let rec = &mut buf[index * RECORD_SIZE..(index + 1) * RECORD_SIZE];
        let mut at = 0usize;
        for p in self.position {
            rec[at..at + 4].copy_from_slice(&p.to_le_bytes());
            at += 4;
        }
        rec[at..at + 4].copy_from_slice(&self.color);
        at += 4;
        for t in self.uv {
            rec[at..at + 2].copy_from_slice(&t.to_le_bytes());
            at += 2;
        }
        rec[at..at + 4].copy_from_slice(&self.flags);
        at += 4;
        for nrm in self.normal {
            rec[at..at + 4].copy_from_slice(&nrm.to_le_bytes());
            at += 4;
        }
    }

    /// Vertex buffer layout matching the serialized record.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: RECORD_SIZE as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Unorm8x4,  // color
        2 => Unorm16x2, // uv
        3 => Uint8x4,   // flags
        4 => Float32x3  // normal
    ];
}

/// Packs a slice of records into a contiguous byte buffer.
pub fn encode_records(records: &[VertexRecord]) -> Vec<u8> {
    let mut buf = vec![0u8; records.len() * RECORD_SIZE];
    for (i, rec) in records.iter().enumerate() {
        rec.encode_into(&mut buf, i);
    }
    buf
}

#[inline]
fn scale_uv(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * 65535.0).round() as u16
}
