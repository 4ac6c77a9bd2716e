//! Landmark topologies
//!
//! Index tables for the MediaPipe pose (33 points), hand (21 points) and face
//! mesh (468 points, 478 with refined irises) landmark layouts, plus the
//! named points the avatar styles anchor on. The face mesh tessellation is
//! data and is loaded from a file.
//!
//! "Left" and "right" follow the subject, not the viewer.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::{EffectsError, Result};

pub const POSE_LANDMARK_COUNT: usize = 33;
pub const HAND_LANDMARK_COUNT: usize = 21;
pub const FACE_MESH_LANDMARK_COUNT: usize = 468;
pub const FACE_MESH_WITH_IRIS_COUNT: usize = 478;

pub const POSE_CONNECTIONS: [(usize, usize); 35] = [
    (0, 1), (1, 2), (2, 3), (3, 7), (0, 4), (4, 5), (5, 6), (6, 8),
    (9, 10), (11, 12), (11, 13), (13, 15), (15, 17), (15, 19), (15, 21),
    (17, 19), (12, 14), (14, 16), (16, 18), (16, 20), (16, 22), (18, 20),
    (11, 23), (12, 24), (23, 24), (23, 25), (24, 26), (25, 27), (26, 28),
    (27, 29), (28, 30), (29, 31), (30, 32), (27, 31), (28, 32),
];

pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    // Palm
    (0, 1), (0, 5), (9, 13), (13, 17), (5, 9), (0, 17),
    // Thumb
    (1, 2), (2, 3), (3, 4),
    // Index
    (5, 6), (6, 7), (7, 8),
    // Middle
    (9, 10), (10, 11), (11, 12),
    // Ring
    (13, 14), (14, 15), (15, 16),
    // Pinky
    (17, 18), (18, 19), (19, 20),
];

/// Face outline, clockwise from the top of the forehead
pub const FACE_OVAL: [usize; 36] = [
    10, 338, 297, 332, 284, 251, 389, 356, 454, 323, 361, 288, 397, 365, 379, 378, 400, 377,
    152, 148, 176, 149, 150, 136, 172, 58, 132, 93, 234, 127, 162, 21, 54, 103, 67, 109,
];

pub const LIPS: [(usize, usize); 40] = [
    // Outer
    (61, 146), (146, 91), (91, 181), (181, 84), (84, 17), (17, 314), (314, 405), (405, 321),
    (321, 375), (375, 291), (61, 185), (185, 40), (40, 39), (39, 37), (37, 0), (0, 267),
    (267, 269), (269, 270), (270, 409), (409, 291),
    // Inner
    (78, 95), (95, 88), (88, 178), (178, 87), (87, 14), (14, 317), (317, 402), (402, 318),
    (318, 324), (324, 308), (78, 191), (191, 80), (80, 81), (81, 82), (82, 13), (13, 312),
    (312, 311), (311, 310), (310, 415), (415, 308),
];

pub const LEFT_EYE: [(usize, usize); 16] = [
    (263, 249), (249, 390), (390, 373), (373, 374), (374, 380), (380, 381), (381, 382),
    (382, 362), (263, 466), (466, 388), (388, 387), (387, 386), (386, 385), (385, 384),
    (384, 398), (398, 362),
];

pub const RIGHT_EYE: [(usize, usize); 16] = [
    (33, 7), (7, 163), (163, 144), (144, 145), (145, 153), (153, 154), (154, 155), (155, 133),
    (33, 246), (246, 161), (161, 160), (160, 159), (159, 158), (158, 157), (157, 173),
    (173, 133),
];

pub const LEFT_EYEBROW: [(usize, usize); 8] = [
    (276, 283), (283, 282), (282, 295), (295, 285), (300, 293), (293, 334), (334, 296),
    (296, 336),
];

pub const RIGHT_EYEBROW: [(usize, usize); 8] = [
    (46, 53), (53, 52), (52, 65), (65, 55), (70, 63), (63, 105), (105, 66), (66, 107),
];

/// Only present on meshes with refined irises
pub const LEFT_IRIS: [(usize, usize); 4] = [(474, 475), (475, 476), (476, 477), (477, 474)];
pub const RIGHT_IRIS: [(usize, usize); 4] = [(469, 470), (470, 471), (471, 472), (472, 469)];

/// Eye corners shared by every avatar style
pub mod eyes {
    pub const RIGHT_OUTER: usize = 33;
    pub const RIGHT_INNER: usize = 133;
    pub const LEFT_INNER: usize = 362;
    pub const LEFT_OUTER: usize = 263;
}

/// Points the cartoon avatar draws on
pub mod cartoon {
    pub use super::eyes::{LEFT_INNER, LEFT_OUTER, RIGHT_INNER, RIGHT_OUTER};
    pub const NOSE_TIP: usize = 1;
}

/// Points the robot avatar wires together
pub mod robot {
    pub use super::eyes::{LEFT_INNER, LEFT_OUTER, RIGHT_INNER, RIGHT_OUTER};
    pub const FOREHEAD: usize = 10;
    pub const NOSE_TIP: usize = 1;
}

/// Points the mask avatar traces
pub mod mask {
    pub use super::eyes::{LEFT_INNER, LEFT_OUTER, RIGHT_INNER, RIGHT_OUTER};
    pub use super::FACE_OVAL as OUTLINE;
}

/// Face oval as closed-loop edges
pub fn face_oval_connections() -> Vec<(usize, usize)> {
    FACE_OVAL
        .iter()
        .enumerate()
        .map(|(i, &a)| (a, FACE_OVAL[(i + 1) % FACE_OVAL.len()]))
        .collect()
}

/// Lips, eyes, eyebrows and face oval
pub fn face_contours() -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(124);
    edges.extend_from_slice(&LIPS);
    edges.extend_from_slice(&LEFT_EYE);
    edges.extend_from_slice(&LEFT_EYEBROW);
    edges.extend_from_slice(&RIGHT_EYE);
    edges.extend_from_slice(&RIGHT_EYEBROW);
    edges.extend(face_oval_connections());
    edges
}

pub fn irises() -> Vec<(usize, usize)> {
    LEFT_IRIS.iter().chain(RIGHT_IRIS.iter()).copied().collect()
}

/// File name of the tessellation table looked up in the model directory
pub const TESSELLATION_FILE: &str = "face_mesh_tessellation.json";

/// Fixed face mesh tessellation over the 468 mesh points.
///
/// Built once from an edge table (MediaPipe's `FACEMESH_TESSELATION`
/// exported as a JSON list of index pairs) and shared by every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    edges: Arc<[(usize, usize)]>,
}

impl Default for Tessellation {
    fn default() -> Self {
        Self::empty()
    }
}

impl Tessellation {
    /// No tessellation; face mesh draws contours and irises only
    pub fn empty() -> Self {
        Self {
            edges: Arc::from(Vec::new()),
        }
    }

    /// Normalize to `(low, high)` pairs and drop repeats.
    ///
    /// Self-loops and indices outside the 468-point mesh are rejected.
    pub fn from_edges(edges: impl IntoIterator<Item = (usize, usize)>) -> Result<Self> {
        let mut unique = BTreeSet::new();
        for (a, b) in edges {
            if a == b || a >= FACE_MESH_LANDMARK_COUNT || b >= FACE_MESH_LANDMARK_COUNT {
                return Err(EffectsError::invalid(format!(
                    "tessellation edge ({}, {}) is outside the {}-point mesh",
                    a, b, FACE_MESH_LANDMARK_COUNT
                )));
            }
            unique.insert((a.min(b), a.max(b)));
        }
        Ok(Self {
            edges: unique.into_iter().collect::<Vec<_>>().into(),
        })
    }

    /// Parse a JSON array of `[a, b]` pairs
    pub fn from_json_str(json: &str) -> Result<Self> {
        let pairs: Vec<(usize, usize)> = serde_json::from_str(json)?;
        Self::from_edges(pairs)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let tessellation = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            edges = tessellation.len(),
            "Loaded face mesh tessellation"
        );
        Ok(tessellation)
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_sizes() {
        assert_eq!(POSE_CONNECTIONS.len(), 35);
        assert_eq!(HAND_CONNECTIONS.len(), 21);
        assert_eq!(FACE_OVAL.len(), 36);
        assert_eq!(face_oval_connections().len(), 36);
        assert_eq!(face_contours().len(), 40 + 16 + 8 + 16 + 8 + 36);
        assert_eq!(irises().len(), 8);
    }

    #[test]
    fn test_indices_in_range() {
        assert!(POSE_CONNECTIONS
            .iter()
            .all(|&(a, b)| a < POSE_LANDMARK_COUNT && b < POSE_LANDMARK_COUNT));
        assert!(HAND_CONNECTIONS
            .iter()
            .all(|&(a, b)| a < HAND_LANDMARK_COUNT && b < HAND_LANDMARK_COUNT));
        assert!(face_contours()
            .iter()
            .all(|&(a, b)| a < FACE_MESH_LANDMARK_COUNT && b < FACE_MESH_LANDMARK_COUNT));
        assert!(irises()
            .iter()
            .all(|&(a, b)| a >= FACE_MESH_LANDMARK_COUNT && b < FACE_MESH_WITH_IRIS_COUNT));
    }

    #[test]
    fn test_face_oval_has_no_repeats() {
        let unique: HashSet<usize> = FACE_OVAL.iter().copied().collect();
        assert_eq!(unique.len(), FACE_OVAL.len());
    }

    #[test]
    fn test_tessellation_normalizes_and_dedupes() {
        // Exported tables list every shared edge once per triangle
        let tessellation = Tessellation::from_edges([(34, 127), (127, 34), (139, 34), (34, 139)]).unwrap();
        assert_eq!(tessellation.edges(), &[(34, 127), (34, 139)]);
    }

    #[test]
    fn test_tessellation_rejects_bad_indices() {
        assert!(matches!(
            Tessellation::from_edges([(0, 468)]),
            Err(EffectsError::InvalidArgument(_))
        ));
        assert!(Tessellation::from_edges([(5, 5)]).is_err());
        // Iris points are not part of the tessellated surface
        assert!(Tessellation::from_edges([(1, 470)]).is_err());
    }

    #[test]
    fn test_tessellation_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TESSELLATION_FILE);
        std::fs::write(&path, "[[127, 34], [34, 139], [139, 127]]").unwrap();

        let tessellation = Tessellation::load(&path).unwrap();
        assert_eq!(tessellation.len(), 3);
        assert!(Tessellation::from_json_str("{\"edges\": []}").is_err());
        assert!(Tessellation::default().is_empty());
    }
}
