//! Vertex colors

/// RGBA color, components in `0.0..=1.0`
pub type MeshColor = [f32; 4];

/// Component-wise mean of a set of colors, `None` when empty
///
/// Used to give a per-group surface the average color of the points it
/// was built from.
pub fn mean_color(colors: impl IntoIterator<Item = MeshColor>) -> Option<MeshColor> {
    let mut sum = [0.0_f64; 4];
    let mut count = 0usize;
    for color in colors {
        for (total, component) in sum.iter_mut().zip(color) {
            *total += f64::from(component);
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum.map(|total| (total / count as f64) as f32))
}
