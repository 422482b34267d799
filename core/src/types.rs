//! file: core/src/types.rs
//! description: the shader type model shared by the source and target IRs.
//!
//! Both IRs talk about the same types: a numeric type is a base type with a
//! vector width and a column count, aggregates nest, and opaque types
//! (samplers, images, atomic counters) carry the dimensionality that
//! texture and image lowering need.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint,
    Int,
    Uint64,
    Int64,
    Float16,
    Float,
    Double,
    Bool,
}

impl BaseType {
    /// Storage width of one component. Booleans are 32-bit words.
    pub fn bit_size(self) -> u8 {
        match self {
            BaseType::Uint8 | BaseType::Int8 => 8,
            BaseType::Uint16 | BaseType::Int16 | BaseType::Float16 => 16,
            BaseType::Uint | BaseType::Int | BaseType::Float | BaseType::Bool => 32,
            BaseType::Uint64 | BaseType::Int64 | BaseType::Double => 64,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, BaseType::Float16 | BaseType::Float | BaseType::Double)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            BaseType::Int8 | BaseType::Int16 | BaseType::Int | BaseType::Int64
        )
    }

    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            BaseType::Uint8 | BaseType::Uint16 | BaseType::Uint | BaseType::Uint64
        )
    }

    pub fn is_integer(self) -> bool {
        self.is_signed_int() || self.is_unsigned_int()
    }

    pub fn is_boolean(self) -> bool {
        self == BaseType::Bool
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplerDim {
    Dim1D,
    Dim2D,
    Dim3D,
    Cube,
    Rect,
    Buf,
    External,
    Ms,
    Subpass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplerType {
    pub dim: SamplerDim,
    pub shadow: bool,
    pub array: bool,
    /// Base type of the texels the sampler returns.
    pub sampled: BaseType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageType {
    pub dim: SamplerDim,
    pub array: bool,
    pub sampled: BaseType,
}

impl ImageType {
    /// Number of coordinate components an access to this image uses.
    pub fn coordinate_components(&self) -> u8 {
        let size = match self.dim {
            SamplerDim::Dim1D | SamplerDim::Buf => 1,
            SamplerDim::Dim2D
            | SamplerDim::Rect
            | SamplerDim::External
            | SamplerDim::Ms
            | SamplerDim::Subpass => 2,
            SamplerDim::Dim3D | SamplerDim::Cube => 3,
        };
        // Cube arrays address layers through the face coordinate.
        if self.array && self.dim != SamplerDim::Cube {
            size + 1
        } else {
            size
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Void,
    Numeric {
        base: BaseType,
        vector_elements: u8,
        matrix_columns: u8,
    },
    Array {
        element: Box<Type>,
        length: u32,
    },
    Struct {
        name: String,
        fields: Vec<StructField>,
    },
    Sampler(SamplerType),
    Image(ImageType),
    AtomicUint,
}

impl Type {
    pub fn scalar(base: BaseType) -> Self {
        Type::vector(base, 1)
    }

    pub fn vector(base: BaseType, n: u8) -> Self {
        Type::Numeric { base, vector_elements: n, matrix_columns: 1 }
    }

    pub fn matrix(base: BaseType, columns: u8, rows: u8) -> Self {
        Type::Numeric { base, vector_elements: rows, matrix_columns: columns }
    }

    pub fn float() -> Self {
        Type::scalar(BaseType::Float)
    }

    pub fn vec(n: u8) -> Self {
        Type::vector(BaseType::Float, n)
    }

    pub fn int() -> Self {
        Type::scalar(BaseType::Int)
    }

    pub fn uint() -> Self {
        Type::scalar(BaseType::Uint)
    }

    pub fn bool() -> Self {
        Type::scalar(BaseType::Bool)
    }

    pub fn array(element: Type, length: u32) -> Self {
        Type::Array { element: Box::new(element), length }
    }

    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            Type::Numeric { base, .. } => Some(*base),
            Type::AtomicUint => Some(BaseType::Uint),
            _ => None,
        }
    }

    /// Components per column; 0 for anything that is not numeric.
    pub fn vector_elements(&self) -> u8 {
        match self {
            Type::Numeric { vector_elements, .. } => *vector_elements,
            Type::AtomicUint => 1,
            _ => 0,
        }
    }

    pub fn matrix_columns(&self) -> u8 {
        match self {
            Type::Numeric { matrix_columns, .. } => *matrix_columns,
            _ => 0,
        }
    }

    pub fn bit_size(&self) -> u8 {
        self.base_type().map(BaseType::bit_size).unwrap_or(32)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Numeric { vector_elements: 1, matrix_columns: 1, .. })
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Numeric { vector_elements: 2..=4, matrix_columns: 1, .. })
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, Type::Numeric { matrix_columns: 2..=4, .. })
    }

    pub fn is_boolean(&self) -> bool {
        self.base_type() == Some(BaseType::Bool) && !self.is_matrix()
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Type::Array { .. } | Type::Struct { .. })
    }

    /// Strip every array level, e.g. `sampler2D[4][2]` -> `sampler2D`.
    pub fn without_array(&self) -> &Type {
        let mut ty = self;
        while let Type::Array { element, .. } = ty {
            ty = element;
        }
        ty
    }

    /// Total number of leaves when every array level is flattened.
    pub fn flattened_array_length(&self) -> u32 {
        match self {
            Type::Array { element, length } => length * element.flattened_array_length(),
            _ => 1,
        }
    }

    pub fn field_type(&self, index: u32) -> Option<&Type> {
        match self {
            Type::Struct { fields, .. } => fields.get(index as usize).map(|f| &f.ty),
            _ => None,
        }
    }

    /// Type produced by indexing: array element, matrix column or vector
    /// component.
    pub fn index_result(&self) -> Option<Type> {
        match self {
            Type::Array { element, .. } => Some((**element).clone()),
            Type::Numeric { base, vector_elements, matrix_columns } if *matrix_columns > 1 => {
                Some(Type::vector(*base, *vector_elements))
            }
            Type::Numeric { base, vector_elements, .. } if *vector_elements > 1 => {
                Some(Type::scalar(*base))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Numeric { base, vector_elements, matrix_columns } => {
                let prefix = match base {
                    BaseType::Uint8 => "u8",
                    BaseType::Int8 => "i8",
                    BaseType::Uint16 => "u16",
                    BaseType::Int16 => "i16",
                    BaseType::Uint => "u32",
                    BaseType::Int => "i32",
                    BaseType::Uint64 => "u64",
                    BaseType::Int64 => "i64",
                    BaseType::Float16 => "f16",
                    BaseType::Float => "f32",
                    BaseType::Double => "f64",
                    BaseType::Bool => "bool",
                };
                match (*matrix_columns, *vector_elements) {
                    (1, 1) => write!(f, "{}", prefix),
                    (1, n) => write!(f, "{}vec{}", prefix, n),
                    (c, r) => write!(f, "{}mat{}x{}", prefix, c, r),
                }
            }
            Type::Array { element, length } => write!(f, "{}[{}]", element, length),
            Type::Struct { name, .. } => write!(f, "struct {}", name),
            Type::Sampler(s) => write!(f, "sampler{:?}{}", s.dim, if s.shadow { "Shadow" } else { "" }),
            Type::Image(i) => write!(f, "image{:?}", i.dim),
            Type::AtomicUint => write!(f, "atomic_uint"),
        }
    }
}
