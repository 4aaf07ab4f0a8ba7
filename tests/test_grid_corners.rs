use approx::assert_relative_eq;
use eoszoo::core::{linspace, parse_grid_corners, GridCorners};
use eoszoo::ZooError;

const STRUCT_METADATA: &str = "GROUP=GridStructure\n\
    \tGROUP=GRID_1\n\
    \t\tGridName=\"MOD_Grid_MOD17A2\"\n\
    \t\tXDim=4\n\
    \t\tYDim=3\n\
    \t\tUpperLeftPointMtrs=(-1111111.111,1111111.111)\n\
    \t\tLowerRightMtrs=(1111111.111,-1111111.111)\n\
    \tEND_GROUP=GRID_1\n\
    END_GROUP=GridStructure\n";

#[test]
fn test_mesh_spans_upper_left_to_lower_right() {
    let corners = parse_grid_corners(STRUCT_METADATA).unwrap();
    let (x, y) = corners.mesh(4, 3);

    assert_eq!(x.dim(), (3, 4));
    assert_eq!(y.dim(), (3, 4));

    assert_relative_eq!(x[[0, 0]], -1111111.111, epsilon = 1e-6);
    assert_relative_eq!(y[[0, 0]], 1111111.111, epsilon = 1e-6);
    assert_relative_eq!(x[[2, 3]], 1111111.111, epsilon = 1e-6);
    assert_relative_eq!(y[[2, 3]], -1111111.111, epsilon = 1e-6);

    // Rows share y, columns share x
    assert_relative_eq!(y[[1, 0]], 0.0, epsilon = 1e-6);
    assert_relative_eq!(y[[1, 3]], 0.0, epsilon = 1e-6);
    assert_relative_eq!(x[[0, 1]], x[[2, 1]]);
}

#[test]
fn test_missing_lower_right_is_metadata_error() {
    let metadata = "UpperLeftPointMtrs=(-1111111.111,1111111.111)";
    assert!(matches!(
        parse_grid_corners(metadata),
        Err(ZooError::Metadata(_))
    ));
}

#[test]
fn test_geotransform_grid_matches_linspace_convention() {
    let gt = [-1000.0, 10.0, 0.0, 500.0, 0.0, -10.0];
    let corners = GridCorners::from_geo_transform(&gt, 100, 50);
    let (x, y) = corners.mesh(100, 50);

    let xs = linspace(-1000.0, -1000.0 + 10.0 * 100.0, 100);
    assert_relative_eq!(x[[0, 99]], xs[99], epsilon = 1e-6);
    assert_relative_eq!(x[[0, 99]], 0.0, epsilon = 1e-6);
    assert_relative_eq!(y[[49, 0]], 0.0, epsilon = 1e-6);
}
