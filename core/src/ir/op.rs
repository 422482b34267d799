//! file: core/src/ir/op.rs
//! description: abstract opcodes of the target IR.
//!
//! Lowering only picks among these; nothing here knows about machine
//! encodings.

use serde::{Deserialize, Serialize};

/// Numeric interpretation of an ALU operand or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AluKind {
    Float,
    Int,
    Uint,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AluType {
    pub kind: AluKind,
    pub bit_size: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundingMode {
    Undef,
    /// Round to nearest even.
    Rtne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AluOp {
    Imov,
    Fmov,
    Vec2,
    Vec3,
    Vec4,
    Convert {
        src: AluType,
        dst: AluType,
        rounding: RoundingMode,
    },

    Fneg,
    Ineg,
    Fabs,
    Iabs,
    Fsign,
    Isign,
    Frcp,
    Frsq,
    Fsqrt,
    Fexp2,
    Flog2,
    Ftrunc,
    Fceil,
    Ffloor,
    Ffract,
    FroundEven,
    Fsin,
    Fcos,
    Fddx,
    FddxCoarse,
    FddxFine,
    Fddy,
    FddyCoarse,
    FddyFine,
    Fsat,
    FrexpSig,
    FrexpExp,
    Ldexp,

    Fadd,
    Iadd,
    Fsub,
    Isub,
    Fmul,
    Imul,
    Fdiv,
    Idiv,
    Udiv,
    Fmod,
    Umod,
    Fmin,
    Imin,
    Umin,
    Fmax,
    Imax,
    Umax,
    Fpow,
    Fdot2,
    Fdot3,
    Fdot4,
    Ffma,
    Flrp,
    ImulHigh,
    UmulHigh,
    UaddCarry,
    UsubBorrow,

    Inot,
    Iand,
    Ior,
    Ixor,
    Ishl,
    Ishr,
    Ushr,
    BitfieldReverse,
    BitCount,
    UfindMsb,
    IfindMsb,
    FindLsb,
    UbitfieldExtract,
    IbitfieldExtract,
    BitfieldInsert,

    // boolean logic on 0.0/1.0 floats
    Fnot,
    Fand,
    For,
    Fxor,

    Flt,
    Ilt,
    Ult,
    Fge,
    Ige,
    Uge,
    Feq,
    Ieq,
    Fne,
    Ine,
    // set-on-compare, producing 0.0/1.0
    Slt,
    Sge,
    Seq,
    Sne,

    BallFequal2,
    BallFequal3,
    BallFequal4,
    BanyFnequal2,
    BanyFnequal3,
    BanyFnequal4,
    BallIequal2,
    BallIequal3,
    BallIequal4,
    BanyInequal2,
    BanyInequal3,
    BanyInequal4,
    FallEqual2,
    FallEqual3,
    FallEqual4,
    FanyNequal2,
    FanyNequal3,
    FanyNequal4,

    Bcsel,
    Fcsel,

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
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntrinsicOp {
    LoadDeref,
    StoreDeref,
    CopyDeref,

    Discard,
    DiscardIf,
    EmitVertex,
    EndPrimitive,
    Barrier,

    InterpDerefAtCentroid,
    InterpDerefAtOffset,
    InterpDerefAtSample,

    AtomicCounterReadDeref,
    AtomicCounterIncDeref,
    AtomicCounterPreDecDeref,
    AtomicCounterAddDeref,
    AtomicCounterAndDeref,
    AtomicCounterOrDeref,
    AtomicCounterXorDeref,
    AtomicCounterMinDeref,
    AtomicCounterMaxDeref,
    AtomicCounterExchangeDeref,
    AtomicCounterCompSwapDeref,

    ImageDerefLoad,
    ImageDerefStore,
    ImageDerefAtomicAdd,
    ImageDerefAtomicImin,
    ImageDerefAtomicUmin,
    ImageDerefAtomicImax,
    ImageDerefAtomicUmax,
    ImageDerefAtomicAnd,
    ImageDerefAtomicOr,
    ImageDerefAtomicXor,
    ImageDerefAtomicExchange,
    ImageDerefAtomicCompSwap,
    ImageDerefSize,
    ImageDerefSamples,

    MemoryBarrier,
    MemoryBarrierAtomicCounter,
    MemoryBarrierBuffer,
    MemoryBarrierImage,
    MemoryBarrierShared,
    GroupMemoryBarrier,

    ShaderClock,

    LoadUbo,
    GetBufferSize,
    LoadSsbo,
    StoreSsbo,
    SsboAtomicAdd,
    SsboAtomicImin,
    SsboAtomicUmin,
    SsboAtomicImax,
    SsboAtomicUmax,
    SsboAtomicAnd,
    SsboAtomicOr,
    SsboAtomicXor,
    SsboAtomicExchange,
    SsboAtomicCompSwap,

    LoadShared,
    StoreShared,
    SharedAtomicAdd,
    SharedAtomicImin,
    SharedAtomicUmin,
    SharedAtomicImax,
    SharedAtomicUmax,
    SharedAtomicAnd,
    SharedAtomicOr,
    SharedAtomicXor,
    SharedAtomicExchange,
    SharedAtomicCompSwap,

    VoteAny,
    VoteAll,
    VoteIeq,
    Ballot,
    ReadInvocation,
    ReadFirstInvocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexOp {
    Tex,
    Txb,
    Txl,
    Txd,
    Txf,
    TxfMs,
    Txs,
    Lod,
    Tg4,
    QueryLevels,
    TextureSamples,
    SamplesIdentical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexSrcKind {
    Coord,
    Projector,
    Comparator,
    Offset,
    Bias,
    Lod,
    Ddx,
    Ddy,
    MsIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexDestType {
    Float,
    Int,
    Uint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JumpKind {
    Break,
    Continue,
    Return,
}

impl std::fmt::Display for AluOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AluOp::Convert { src, dst, rounding } => {
                write!(f, "convert.{:?}{}->{:?}{}", src.kind, src.bit_size, dst.kind, dst.bit_size)?;
                match rounding {
                    RoundingMode::Undef => Ok(()),
                    r => write!(f, ".{:?}", r),
                }
            }
            other => write!(f, "{}", snake_case(&format!("{:?}", other))),
        }
    }
}

impl std::fmt::Display for IntrinsicOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", snake_case(&format!("{:?}", self)))
    }
}

impl std::fmt::Display for TexOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", snake_case(&format!("{:?}", self)))
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
