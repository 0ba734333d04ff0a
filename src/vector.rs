/// Squared Euclidean distance. LOWER is closer.
///
/// No sqrt: ranking by the squared value is identical and the index only ranks.
/// Eight independent accumulators let LLVM keep one AVX2 register busy
/// without a loop-carried dependency on a single sum.
#[inline(always)]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut acc = [0.0f32; 8];
    let a_chunks = a.chunks_exact(8);
    let b_chunks = b.chunks_exact(8);
    let a_rem = a_chunks.remainder();
    let b_rem = b_chunks.remainder();

    for (ac, bc) in a_chunks.zip(b_chunks) {
        for lane in 0..8 {
            let d = ac[lane] - bc[lane];
            acc[lane] += d * d;
        }
    }

    let mut sum: f32 = acc.iter().sum();
    for (x, y) in a_rem.iter().zip(b_rem) {
        let d = x - y;
        sum += d * d;
    }
    sum
}

/// Scale `v` to unit length in place. The zero vector is left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
