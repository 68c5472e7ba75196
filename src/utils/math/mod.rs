use num::Num;

/// Euclidean distance
/// d(a, b) = sqrt(Σ((a_i - b_i)^2))
///
/// Both slices must have the same length; callers check dimensions first.
#[inline]
pub fn euclidean_distance<N>(vec: &[N], other: &[N]) -> f64
where
    N: Num + Copy + Into<f64>,
{
    debug_assert_eq!(
        vec.len(),
        other.len(),
        "Vectors must be of the same length to compute euclidean distance."
    );
    vec.iter()
        .zip(other.iter())
        .map(|(&a, &b)| {
            let d = Into::<f64>::into(a) - Into::<f64>::into(b);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Row vector times a row-major matrix
/// out_j = Σ_i(v_i * m_ij)
///
/// # Arguments
/// * `vec` - row vector of length `rows`
/// * `matrix` - row-major data, `rows * cols` values
/// * `cols` - column count
///
/// # Returns
/// * `Vec<f64>` - vector of length `cols`
pub fn vec_mat_mul<N>(vec: &[N], matrix: &[f64], cols: usize) -> Vec<f64>
where
    N: Num + Copy + Into<f64>,
{
    debug_assert_eq!(vec.len() * cols, matrix.len());
    let mut out = vec![0.0_f64; cols];
    for (row, &v) in matrix.chunks_exact(cols.max(1)).zip(vec.iter()) {
        let v: f64 = v.into();
        // 疎な頻度ベクトルが大半なのでゼロ行は飛ばす
        if v == 0.0 {
            continue;
        }
        for (o, &m) in out.iter_mut().zip(row.iter()) {
            *o += v * m;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basic() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(euclidean_distance(&[1u32, 2, 3], &[1u32, 2, 3]), 0.0);
        assert_eq!(euclidean_distance::<f64>(&[], &[]), 0.0);
    }

    #[test]
    fn vec_mat_mul_matches_hand_product() {
        // [1 2] x [[1 0 2], [0 1 3]] = [1 2 8]
        let m = [1.0, 0.0, 2.0, 0.0, 1.0, 3.0];
        assert_eq!(vec_mat_mul(&[1.0, 2.0], &m, 3), vec![1.0, 2.0, 8.0]);
    }

    #[test]
    fn vec_mat_mul_zero_vector_gives_zero() {
        let m = [5.0, 6.0, 7.0, 8.0];
        assert_eq!(vec_mat_mul(&[0.0, 0.0], &m, 2), vec![0.0, 0.0]);
    }
}
