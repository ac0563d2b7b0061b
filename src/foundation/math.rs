/// Map a unit-interval value onto `0..=255`, clamping out-of-range input.
pub(crate) fn unit_to_u8(v: f32) -> u8 {
    ((v.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u8
}

/// Constant-alpha "over": `src * a + dst * (1 - a)` on all four channels.
///
/// The alpha comes from the draw call, not from the source pixel, so a fully transparent source
/// texel still darkens/replaces the destination proportionally to `alpha`.
pub(crate) fn blend_constant_alpha(dst: [u8; 4], src: [u8; 4], alpha: u8) -> [u8; 4] {
    let a = u32::from(alpha);
    let ia = 255 - a;
    let mut out = [0u8; 4];
    for i in 0..4 {
        let v = u32::from(src[i]) * a + u32::from(dst[i]) * ia;
        out[i] = ((v + 127) / 255) as u8;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
