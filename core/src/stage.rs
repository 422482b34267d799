//! file: core/src/stage.rs
//! description: pipeline stages and the per-stage layout annotations.
//!
//! The front-end resolves layout qualifiers into a `StageLayout`; lowering
//! copies it into the target shader's info record unchanged.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Vertex,
    TessCtrl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    Points,
    Lines,
    LinesAdjacency,
    Triangles,
    TrianglesAdjacency,
    LineStrip,
    TriangleStrip,
    Quads,
    Isolines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TessSpacing {
    Equal,
    FractionalOdd,
    FractionalEven,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthLayout {
    None,
    Any,
    Greater,
    Less,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageLayout {
    Vertex,
    TessCtrl {
        vertices_out: u32,
    },
    TessEval {
        primitive_mode: Primitive,
        spacing: TessSpacing,
        ccw: bool,
        point_mode: bool,
    },
    Geometry {
        vertices_in: u32,
        vertices_out: u32,
        invocations: u32,
        input_primitive: Primitive,
        output_primitive: Primitive,
    },
    Fragment {
        early_fragment_tests: bool,
        depth_layout: DepthLayout,
        origin_upper_left: bool,
    },
    Compute {
        local_size: [u32; 3],
        shared_size: u32,
    },
}

impl StageLayout {
    pub fn stage(&self) -> Stage {
        match self {
            StageLayout::Vertex => Stage::Vertex,
            StageLayout::TessCtrl { .. } => Stage::TessCtrl,
            StageLayout::TessEval { .. } => Stage::TessEval,
            StageLayout::Geometry { .. } => Stage::Geometry,
            StageLayout::Fragment { .. } => Stage::Fragment,
            StageLayout::Compute { .. } => Stage::Compute,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Vertex => "vertex",
            Stage::TessCtrl => "tess_ctrl",
            Stage::TessEval => "tess_eval",
            Stage::Geometry => "geometry",
            Stage::Fragment => "fragment",
            Stage::Compute => "compute",
        };
        write!(f, "{}", s)
    }
}
