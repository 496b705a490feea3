// Big-endian field readers for TSIP payloads.
//
// Readers run after the route length guard; out-of-range offsets read as zero.

pub fn ub(buf: &[u8], off: usize) -> u8 {
    buf.get(off).copied().unwrap_or(0)
}

pub fn sb(buf: &[u8], off: usize) -> i8 {
    ub(buf, off) as i8
}

fn array<const N: usize>(buf: &[u8], off: usize) -> [u8; N] {
    let mut out = [0_u8; N];
    if let Some(src) = off.checked_add(N).and_then(|end| buf.get(off..end)) {
        out.copy_from_slice(src);
    }
    out
}

pub fn beu16(buf: &[u8], off: usize) -> u16 {
    u16::from_be_bytes(array(buf, off))
}

pub fn bes16(buf: &[u8], off: usize) -> i16 {
    i16::from_be_bytes(array(buf, off))
}

pub fn beu32(buf: &[u8], off: usize) -> u32 {
    u32::from_be_bytes(array(buf, off))
}

pub fn bes32(buf: &[u8], off: usize) -> i32 {
    i32::from_be_bytes(array(buf, off))
}

pub fn beu64(buf: &[u8], off: usize) -> u64 {
    u64::from_be_bytes(array(buf, off))
}

pub fn bef32(buf: &[u8], off: usize) -> f64 {
    f64::from(f32::from_be_bytes(array(buf, off)))
}

pub fn bed64(buf: &[u8], off: usize) -> f64 {
    f64::from_be_bytes(array(buf, off))
}

// Length-prefixed ASCII name, clamped to 40 bytes and to what is actually present.
pub fn name_field(buf: &[u8], off: usize, declared: usize) -> String {
    let available = buf.len().saturating_sub(off);
    let take = declared.min(40).min(available);
    buf.get(off..off + take)
        .map(|raw| {
            String::from_utf8_lossy(raw)
                .trim_end_matches('\0')
                .to_string()
        })
        .unwrap_or_default()
}

// Writers used when building outbound command bodies.
pub fn put_be16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn put_be32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn put_bef32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn hexdump(buf: &[u8]) -> String {
    buf.iter().map(|b| format!("{b:02x}")).collect()
}
