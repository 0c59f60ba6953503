use nalgebra::{Matrix4, Rotation3, Vector3};

/// Fixed reorientation composed onto every node world transform before it
/// becomes a bone rest matrix: −90° about Z followed onto −90° about Y maps
/// the source format's axis convention into bone space (Y along the bone).
pub(crate) fn bone_reorientation() -> Matrix4<f32> {
    let rot_z = Rotation3::from_axis_angle(&Vector3::z_axis(), -std::f32::consts::FRAC_PI_2);
    let rot_y = Rotation3::from_axis_angle(&Vector3::y_axis(), -std::f32::consts::FRAC_PI_2);
    (rot_z * rot_y).to_homogeneous()
}

pub(crate) fn translation_of(matrix: &Matrix4<f32>) -> Vector3<f32> {
    Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}

pub(crate) fn basis_column(matrix: &Matrix4<f32>, column: usize) -> Vector3<f32> {
    Vector3::new(
        matrix[(0, column)],
        matrix[(1, column)],
        matrix[(2, column)],
    )
}

/// Re-rolls a bone rest matrix about its own Y axis so that the local Z axis
/// points as closely as possible toward global +Z, matching the roll pass the
/// host runs over a freshly built rig. Translation and the Y axis itself are
/// untouched. Degenerate cases (zero-length axis, bone pointing straight
/// along global Z) return the matrix unchanged.
pub(crate) fn with_roll_toward_global_z(matrix: &Matrix4<f32>) -> Matrix4<f32> {
    let y = basis_column(matrix, 1);
    if y.norm_squared() < 1e-12 {
        return *matrix;
    }
    let y = y.normalize();

    let global_z = Vector3::z();
    let z = global_z - y * global_z.dot(&y);
    if z.norm_squared() < 1e-10 {
        return *matrix;
    }
    let z = z.normalize();
    let x = y.cross(&z);

    let translation = translation_of(matrix);
    let mut rolled = Matrix4::identity();
    for row in 0..3 {
        rolled[(row, 0)] = x[row];
        rolled[(row, 1)] = y[row];
        rolled[(row, 2)] = z[row];
        rolled[(row, 3)] = translation[row];
    }
    rolled
}
