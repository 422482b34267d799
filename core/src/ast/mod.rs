//! The source IR: a typed, validated shader tree produced by the front-end.

pub mod kind;
pub mod node;

pub use kind::{Builtin, ExprOp, Interpolation, IntrinsicId, LoopJump, TextureOp, VarMode};
pub use node::{
    Call, ConstantLit, Deref, Expression, Literal, LodInfo, Node, Rvalue, Scalar, Signature,
    SignatureId, SourceShader, SourceVarId, Swizzle, Texture, VarDecl,
};
