//! file: core/src/ast/kind.rs
//! description: closed operator and call catalogues of the source IR.
//!
//! Defines `ExprOp`, `TextureOp`, `IntrinsicId` and the variable modes.
//! These enums are produced by the front-end and consumed by lowering.

use serde::{Deserialize, Serialize};

/// Expression operators, grouped by arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprOp {
    // unary
    BitNot,
    LogicNot,
    Neg,
    Abs,
    Sign,
    Rcp,
    Rsq,
    Sqrt,
    Exp,
    Log,
    Exp2,
    Log2,
    /// Numeric conversion from the operand's type to the result type.
    Convert,
    BitcastI2F,
    BitcastF2I,
    BitcastU2F,
    BitcastF2U,
    BitcastI642D,
    BitcastD2I64,
    BitcastU642D,
    BitcastD2U64,
    Trunc,
    Ceil,
    Floor,
    Fract,
    RoundEven,
    Sin,
    Cos,
    Dfdx,
    DfdxCoarse,
    DfdxFine,
    Dfdy,
    DfdyCoarse,
    DfdyFine,
    PackSnorm2x16,
    PackSnorm4x8,
    PackUnorm2x16,
    PackUnorm4x8,
    PackHalf2x16,
    UnpackSnorm2x16,
    UnpackSnorm4x8,
    UnpackUnorm2x16,
    UnpackUnorm4x8,
    UnpackHalf2x16,
    PackDouble2x32,
    UnpackDouble2x32,
    BitfieldReverse,
    BitCount,
    FindMsb,
    FindLsb,
    Saturate,
    FrexpSig,
    FrexpExp,
    Noise,
    InterpolateAtCentroid,
    GetBufferSize,
    SsboUnsizedArrayLength,
    SubroutineToInt,

    // binary
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Greater,
    Lequal,
    Gequal,
    Equal,
    Nequal,
    AllEqual,
    AnyNequal,
    LogicAnd,
    LogicXor,
    LogicOr,
    BitAnd,
    BitXor,
    BitOr,
    Lshift,
    Rshift,
    Min,
    Max,
    Pow,
    Dot,
    ImulHigh,
    Carry,
    Borrow,
    Ldexp,
    UboLoad,
    VectorExtract,
    InterpolateAtOffset,
    InterpolateAtSample,

    // ternary
    Fma,
    Lrp,
    Csel,
    BitfieldExtract,
    VectorInsert,

    // quaternary
    BitfieldInsert,
    Vector,
}

impl ExprOp {
    /// Operators the front-end must have decomposed before lowering runs.
    pub fn must_be_lowered_upstream(self) -> bool {
        matches!(
            self,
            ExprOp::Exp
                | ExprOp::Log
                | ExprOp::Noise
                | ExprOp::VectorExtract
                | ExprOp::VectorInsert
                | ExprOp::SsboUnsizedArrayLength
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureOp {
    /// Plain sample.
    Tex,
    /// Sample with LOD bias.
    Txb,
    /// Sample with explicit LOD.
    Txl,
    /// Sample with explicit gradients.
    Txd,
    /// Texel fetch.
    Txf,
    /// Multisample texel fetch.
    TxfMs,
    /// Size query.
    Txs,
    /// Implicit LOD query.
    Lod,
    /// Gather.
    Tg4,
    QueryLevels,
    TextureSamples,
    SamplesIdentical,
}

/// Compiler-internal pseudo-functions. A signature carrying one of these
/// is never turned into a target function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntrinsicId {
    AtomicCounterRead,
    AtomicCounterIncrement,
    AtomicCounterPredecrement,
    AtomicCounterAdd,
    AtomicCounterAnd,
    AtomicCounterOr,
    AtomicCounterXor,
    AtomicCounterMin,
    AtomicCounterMax,
    AtomicCounterExchange,
    AtomicCounterCompSwap,

    ImageLoad,
    ImageStore,
    ImageAtomicAdd,
    ImageAtomicMin,
    ImageAtomicMax,
    ImageAtomicAnd,
    ImageAtomicOr,
    ImageAtomicXor,
    ImageAtomicExchange,
    ImageAtomicCompSwap,
    ImageSize,
    ImageSamples,

    MemoryBarrier,
    MemoryBarrierAtomicCounter,
    MemoryBarrierBuffer,
    MemoryBarrierImage,
    MemoryBarrierShared,
    GroupMemoryBarrier,

    ShaderClock,

    SsboLoad,
    SsboStore,
    SsboAtomicAdd,
    SsboAtomicMin,
    SsboAtomicMax,
    SsboAtomicAnd,
    SsboAtomicOr,
    SsboAtomicXor,
    SsboAtomicExchange,
    SsboAtomicCompSwap,

    SharedLoad,
    SharedStore,
    SharedAtomicAdd,
    SharedAtomicMin,
    SharedAtomicMax,
    SharedAtomicAnd,
    SharedAtomicOr,
    SharedAtomicXor,
    SharedAtomicExchange,
    SharedAtomicCompSwap,

    VoteAny,
    VoteAll,
    VoteEq,
    Ballot,
    ReadInvocation,
    ReadFirstInvocation,
}

/// Storage mode of a source variable as the front-end declared it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarMode {
    Auto,
    Temporary,
    Uniform,
    ShaderStorage,
    ShaderIn,
    ShaderOut,
    SystemValue,
    Shared,
    FunctionIn,
    FunctionOut,
    FunctionInout,
    ConstIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interpolation {
    Smooth,
    Flat,
    NoPerspective,
}

/// Built-in variables whose lowering differs from ordinary declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Builtin {
    Position,
    PointSize,
    ClipDistance,
    CullDistance,
    FragCoord,
    FragDepth,
    VertexId,
    InstanceId,
    LocalInvocationId,
    WorkGroupId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopJump {
    Break,
    Continue,
}
