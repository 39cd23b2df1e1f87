//! Demonstration of proximity queries and hull surfaces

use molgeom::*;

fn main() -> Result<()> {
    // Two small "chains" a few Ångströms apart
    let chain_a = PointSet::new(
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.5, 0.0, 0.0),
            Point::new(3.0, 0.4, 0.0),
            Point::new(4.5, 0.0, 0.3),
            Point::new(4.5, 0.0, 0.32),
        ],
        vec!["/A 1 N", "/A 1 CA", "/A 1 C", "/A 2 N", "/A 2 N'"],
    )?;
    let chain_b = PointSet::new(
        vec![
            Point::new(0.5, 3.2, 0.0),
            Point::new(2.0, 2.6, 1.0),
            Point::new(3.5, 3.0, 0.2),
        ],
        vec!["/B 7 OD1", "/B 7 CG", "/B 8 N"],
    )?;

    let ops = ProximityOps::new(ProximityConfig::default());

    println!("{}", ops.closest(&chain_a, &chain_b));

    let overlapped = ops.find_overlaps(&chain_a);
    println!("{} overlapped points: {:?}", overlapped.len(), overlapped);

    let bonds = ops.connect(&chain_a, &chain_a, |_, _| false);
    println!("Bonds within chain A:");
    for (i, j) in &bonds {
        println!("  {} - {}", chain_a.ids()[*i], chain_a.ids()[*j]);
    }

    // Hull around both chains, one surface per chain
    let mut points = chain_a.points().to_vec();
    points.extend_from_slice(chain_b.points());
    let all = PointSet::from_points(points);
    let keys: Vec<char> = (0..all.len())
        .map(|i| if i < chain_a.len() { 'A' } else { 'B' })
        .collect();

    let whole = ConvexHullBuilder::new().sharp(true).build(&all)?;
    let buffers = whole.mesh.to_buffers();
    println!("\n{}:", whole.name);
    println!("  Vertices: {}", buffers.vertex_count());
    println!("  Triangles: {}", buffers.triangle_count());

    match ConvexHullBuilder::new().build_groups(&all, &keys, None) {
        Ok(surfaces) => {
            for (chain, surface) in surfaces {
                println!("Chain {}: {} triangles", chain, surface.mesh.triangle_count());
            }
        }
        Err(err) => println!("Per-chain hulls skipped: {}", err),
    }

    // Sharp hulls share no vertices, so find pieces on the smooth one
    let smooth = ConvexHullBuilder::new().build(&all)?;
    let centers = blob_centers(&smooth.mesh, None)?;
    println!("Surface pieces: {}", centers.len());

    Ok(())
}
