use super::units::Float;

pub(crate) fn difference(a: &[Float], b: &[Float]) -> Vec<Float> {
    a.iter().zip(b.iter()).map(|(x, y)| x - y).collect()
}

pub(crate) fn dot(a: &[Float], b: &[Float]) -> Float {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum::<Float>()
}

pub(crate) fn norm(a: &[Float]) -> Float {
    dot(a, a).sqrt()
}

/// Pads a 2-D vector with a zero z-component; 3-D vectors pass through.
pub(crate) fn embed_3d(a: &[Float]) -> [Float; 3] {
    let mut out = [0.; 3];
    for (i, x) in a.iter().take(3).enumerate() {
        out[i] = *x;
    }
    out
}
