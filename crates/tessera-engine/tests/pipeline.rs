//! End-to-end flow: polygon outlines through triangulation into
//! state-segmented GPU buffers.

use tessera_engine::batch::{
    BatchAggregator, PassId, RenderMode, RenderState, RenderSubmission, ShaderId, TextureId,
};
use tessera_engine::coords::Vec2;
use tessera_engine::geom::Polygon;
use tessera_engine::tess::TriangulateError;
use tessera_engine::vertex::{VertexRecord, RECORD_SIZE};

fn poly(pts: &[(f32, f32)]) -> Polygon {
    Polygon::from_verts(pts.iter().map(|&(x, y)| Vec2::new(x, y))).unwrap()
}

fn square(x: f32, y: f32, size: f32) -> Polygon {
    poly(&[(x, y), (x + size, y), (x + size, y + size), (x, y + size)])
}

const PASS: PassId = PassId(0);
const WHITE: [u8; 4] = [255, 255, 255, 255];

#[test]
fn polygon_fill_reaches_the_buffers() {
    let state = RenderState::new(PASS, ShaderId(1), RenderMode::Triangles);
    let fill = RenderSubmission::polygon_fill(&square(0.0, 0.0, 10.0), state, WHITE).unwrap();

    let mut agg = BatchAggregator::new();
    agg.add(fill).unwrap();
    let buf = agg.upload().unwrap();

    assert_eq!(buf.vertex_count(), 4);
    assert_eq!(buf.index_count(), 6);
    assert_eq!(buf.vertex_data().len(), 4 * RECORD_SIZE);

    let segs = buf.segments(PASS);
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].mode, RenderMode::Triangles);
    assert_eq!(segs[0].index_offset, 0);
    assert_eq!(segs[0].index_count, 6);

    // Second record starts one stride in, with its serialized x position.
    assert_eq!(&buf.vertex_data()[RECORD_SIZE..RECORD_SIZE + 4], &10.0f32.to_le_bytes());
}

#[test]
fn mixed_sources_renumber_and_segment() {
    let plain = RenderState::new(PASS, ShaderId(1), RenderMode::Triangles);
    let textured = RenderState::new(PASS, ShaderId(2), RenderMode::Triangles)
        .with_texture(TextureId(4));

    let mut agg = BatchAggregator::new();
    agg.add(RenderSubmission::polygon_fill(&square(0.0, 0.0, 10.0), plain, WHITE).unwrap())
        .unwrap();
    agg.add(RenderSubmission::polygon_fill(&square(20.0, 0.0, 10.0), plain, WHITE).unwrap())
        .unwrap();

    let quad = vec![
        VertexRecord::new([40.0, 0.0, 0.0]).with_uv(0.0, 0.0),
        VertexRecord::new([50.0, 0.0, 0.0]).with_uv(1.0, 0.0),
        VertexRecord::new([50.0, 10.0, 0.0]).with_uv(1.0, 1.0),
        VertexRecord::new([40.0, 10.0, 0.0]).with_uv(0.0, 1.0),
    ];
    agg.add(RenderSubmission::new(quad, vec![0, 1, 2, 0, 2, 3], textured))
        .unwrap();

    let buf = agg.upload().unwrap();
    assert_eq!(buf.vertex_count(), 12);

    let segs = buf.segments(PASS);
    assert_eq!(segs.len(), 2);
    // Both untextured fills merge; the textured quad stands alone.
    assert_eq!(segs[0].index_count, 12);
    assert_eq!(segs[0].texture, None);
    assert_eq!(segs[1].index_count, 6);
    assert_eq!(segs[1].texture, Some(TextureId(4)));

    // Every index of the second fill is offset by the first fill's 4
    // vertices, and the quad's by 8.
    assert!(buf.indices()[6..12].iter().all(|&i| (4..8).contains(&i)));
    assert!(buf.indices()[12..].iter().all(|&i| (8..12).contains(&i)));
}

#[test]
fn depth_sorted_pass_interleaves_states() {
    let mut agg = BatchAggregator::new();
    agg.set_depth_sort(PASS, true);

    let near = RenderState::new(PASS, ShaderId(1), RenderMode::Triangles).with_depth(0.5);
    let far = RenderState::new(PASS, ShaderId(2), RenderMode::Triangles).with_depth(2.0);
    let middle = RenderState::new(PASS, ShaderId(1), RenderMode::Triangles).with_depth(1.0);

    for state in [near, far, middle] {
        agg.add(RenderSubmission::polygon_fill(&square(0.0, 0.0, 10.0), state, WHITE).unwrap())
            .unwrap();
    }

    let buf = agg.upload().unwrap();
    let segs = buf.segments(PASS);
    // Depth order: 0.5 (shader 1), 1.0 (shader 1), 2.0 (shader 2). The two
    // shader-1 fills end up adjacent and still merge; the far fill cuts a
    // second segment.
    assert_eq!(segs.len(), 2);
    assert_eq!(segs[0].shader, ShaderId(1));
    assert_eq!(segs[0].index_count, 12);
    assert_eq!(segs[1].shader, ShaderId(2));
}

#[test]
fn self_intersecting_outline_is_rejected() {
    let eight = poly(&[
        (4.0, 0.0),
        (4.0, 4.0),
        (0.0, 4.0),
        (0.0, 0.0),
        (16.0, 6.0),
        (16.0, -2.0),
    ]);
    let state = RenderState::new(PASS, ShaderId(1), RenderMode::Triangles);
    assert_eq!(
        RenderSubmission::polygon_fill(&eight, state, WHITE).unwrap_err(),
        TriangulateError::NoEarFound
    );
}

#[test]
fn hit_testing_uses_the_same_outline() {
    let outline = square(5.0, 5.0, 10.0);
    assert!(outline.point_in_polygon(Vec2::new(10.0, 10.0)));
    assert!(!outline.point_in_polygon(Vec2::new(2.0, 2.0)));

    // The bounding box is the cheap pre-filter.
    let bounds = outline.bounds().unwrap();
    assert!(bounds.contains(Vec2::new(10.0, 10.0)));
    assert!(!bounds.contains(Vec2::new(20.0, 2.0)));
}
