pub mod deref;
mod display;
pub mod lower;
pub mod op;
pub mod shader;
pub mod value;

pub use self::deref::{ArrayIndex, DerefArena, DerefChain, DerefId, DerefKind, DerefLink};
pub use self::lower::{Capabilities, lower_shader};
pub use self::shader::{
    AluSrc, CfNode, FuncId, Function, FunctionImpl, Indices, InstId, Instr, InstrKind, Shader,
    ShaderInfo, Src, StorageClass, TexInstr, TexSrc, VarId, Variable,
};
pub use self::value::{Constant, SsaDef, ValueId};
