use ndarray::{Array1, ArrayView1, ArrayViewMut1};

pub fn l2_norm(vector: ArrayView1<'_, f32>) -> f32 {
    vector.dot(&vector).sqrt()
}

/// Scales `vector` to unit length in place. Zero vectors are left untouched.
pub fn normalize_in_place(mut vector: ArrayViewMut1<'_, f32>) {
    let norm = l2_norm(vector.view());
    if norm > f32::EPSILON {
        vector.mapv_inplace(|value| value / norm);
    }
}

pub fn normalized(query: &[f32]) -> Array1<f32> {
    let mut vector = Array1::from(query.to_vec());
    normalize_in_place(vector.view_mut());
    vector
}

pub fn squared_l2_distance(left: ArrayView1<'_, f32>, right: ArrayView1<'_, f32>) -> f32 {
    left.iter()
        .zip(right.iter())
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum()
}
