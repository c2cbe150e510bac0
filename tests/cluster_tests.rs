#![allow(missing_docs)]

use ecosim::simulation::cluster::ClusterLayout;
use ecosim::simulation::geometry::length;

#[test]
fn test_single_cluster_at_origin() {
    let layout = ClusterLayout::new(1, 100.0, 400.0);
    assert_eq!(layout.len(), 1);
    let cluster = layout.clusters()[0];
    assert_eq!(cluster.center.x, 0.0);
    assert_eq!(cluster.center.y, 0.0);
    assert_eq!(cluster.radius, 100.0);
}

#[test]
fn test_two_clusters_are_symmetric() {
    let spacing = 400.0;
    let layout = ClusterLayout::new(2, 100.0, spacing);
    let [a, b] = [layout.clusters()[0].center, layout.clusters()[1].center];

    assert!((length(a - b) - spacing).abs() < 1e-3);
    assert!((a.x + b.x).abs() < 1e-3);
    assert!((a.y + b.y).abs() < 1e-3);
}

#[test]
fn test_five_clusters_on_polygon() {
    let spacing = 300.0;
    let layout = ClusterLayout::new(5, 50.0, spacing);
    let expected = spacing / (2.0 * (std::f32::consts::PI / 5.0).sin());

    assert_eq!(layout.len(), 5);
    for cluster in layout.clusters() {
        assert!((length(cluster.center) - expected).abs() < 1e-2);
    }
    // neighbors sit exactly `spacing` apart
    for i in 0..5 {
        let a = layout.clusters()[i].center;
        let b = layout.clusters()[(i + 1) % 5].center;
        assert!((length(a - b) - spacing).abs() < 1e-2);
    }
}

#[test]
fn test_ids_follow_order() {
    let layout = ClusterLayout::new(4, 10.0, 100.0);
    for (i, cluster) in layout.clusters().iter().enumerate() {
        assert_eq!(cluster.id, i);
    }
}
