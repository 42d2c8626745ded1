//! Formatting utilities

use glam::{Mat4, Quat, Vec3};
use humansize::{DECIMAL, format_size};

/// Format a byte count in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a four-byte chunk tag as text, e.g. `0x4E4F534A` as `"JSON"`
pub fn format_chunk_tag(tag: u32) -> String {
    tag.to_le_bytes()
        .iter()
        .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
        .collect()
}

pub fn format_vec3(v: Vec3) -> String {
    format!("[{:.3}, {:.3}, {:.3}]", v.x, v.y, v.z)
}

pub fn format_quat(q: Quat) -> String {
    format!("[{:.3}, {:.3}, {:.3}, {:.3}]", q.x, q.y, q.z, q.w)
}

/// Format a matrix as four rows, each prefixed with `indent`
pub fn format_mat4(m: Mat4, indent: &str) -> String {
    (0..4)
        .map(|row| {
            let r = m.row(row);
            format!(
                "{indent}[{:>9.4} {:>9.4} {:>9.4} {:>9.4}]",
                r.x, r.y, r.z, r.w
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
