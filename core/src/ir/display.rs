//! Human-readable dump of a lowered shader.

use std::fmt;

use super::deref::{ArrayIndex, DerefId, DerefKind};
use super::shader::{CfNode, Instr, InstrKind, Shader, Src};

impl Shader {
    fn fmt_deref(&self, f: &mut fmt::Formatter<'_>, head: DerefId) -> fmt::Result {
        for (_, link) in self.derefs.walk(head) {
            match link.kind {
                DerefKind::Var(v) => write!(f, "&{}", self.variable(v).name)?,
                DerefKind::Struct { index } => write!(f, ".{}", index)?,
                DerefKind::Array(ArrayIndex::Direct(i)) => write!(f, "[{}]", i)?,
                DerefKind::Array(ArrayIndex::Indirect(v)) => write!(f, "[{}]", v)?,
            }
        }
        Ok(())
    }

    fn fmt_instr(&self, f: &mut fmt::Formatter<'_>, instr: &Instr) -> fmt::Result {
        if let Some(dest) = instr.dest {
            let def = self.value(dest);
            write!(f, "vec{} {}: {} = ", def.num_components, def.bit_size, dest)?;
        }
        match &instr.kind {
            InstrKind::Alu { op, srcs } => {
                write!(f, "{}", op)?;
                for (i, s) in srcs.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { " " } else { ", " }, s.value)?;
                    let n = self.value(s.value).num_components as usize;
                    let identity = (0..n).all(|c| s.swizzle[c] as usize == c);
                    if !identity || n == 0 {
                        write!(f, ".")?;
                        for c in s.swizzle.iter() {
                            write!(f, "{}", ['x', 'y', 'z', 'w'][*c as usize & 3])?;
                        }
                    }
                }
                Ok(())
            }
            InstrKind::Intrinsic { op, srcs, indices } => {
                write!(f, "{} (", op)?;
                for (i, s) in srcs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match s {
                        Src::Ssa(v) => write!(f, "{}", v)?,
                        Src::Deref(d) => self.fmt_deref(f, *d)?,
                    }
                }
                write!(f, ")")?;
                if let Some(mask) = indices.write_mask {
                    write!(f, " (wrmask=0x{:x})", mask)?;
                }
                if let Some(base) = indices.base {
                    write!(f, " (base={})", base)?;
                }
                if let Some(stream) = indices.stream_id {
                    write!(f, " (stream={})", stream)?;
                }
                Ok(())
            }
            InstrKind::Tex(tex) => {
                write!(f, "tex.{} ", tex.op)?;
                self.fmt_deref(f, tex.texture)?;
                for s in tex.srcs.iter() {
                    write!(f, ", {} ({:?})", s.value, s.kind)?;
                }
                Ok(())
            }
            InstrKind::Call { callee, params, return_deref } => {
                write!(f, "call {} (", self.function(*callee).name)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.fmt_deref(f, *p)?;
                }
                write!(f, ")")?;
                if let Some(ret) = return_deref {
                    write!(f, " -> ")?;
                    self.fmt_deref(f, *ret)?;
                }
                Ok(())
            }
            InstrKind::Jump(kind) => write!(f, "{}", format!("{:?}", kind).to_lowercase()),
            InstrKind::Undef => write!(f, "undefined"),
            InstrKind::LoadConst { bits, .. } => {
                write!(f, "load_const (")?;
                for (i, b) in bits.iter().enumerate() {
                    write!(f, "{}0x{:x}", if i == 0 { "" } else { ", " }, b)?;
                }
                write!(f, ")")
            }
        }
    }

    fn fmt_body(&self, f: &mut fmt::Formatter<'_>, body: &[CfNode], depth: usize) -> fmt::Result {
        let pad = "    ".repeat(depth);
        for node in body {
            match node {
                CfNode::Instr(id) => {
                    write!(f, "{}", pad)?;
                    self.fmt_instr(f, self.instr(*id))?;
                    writeln!(f)?;
                }
                CfNode::If { condition, then_body, else_body } => {
                    writeln!(f, "{}if {} {{", pad, condition)?;
                    self.fmt_body(f, then_body, depth + 1)?;
                    if !else_body.is_empty() {
                        writeln!(f, "{}}} else {{", pad)?;
                        self.fmt_body(f, else_body, depth + 1)?;
                    }
                    writeln!(f, "{}}}", pad)?;
                }
                CfNode::Loop { body } => {
                    writeln!(f, "{}loop {{", pad)?;
                    self.fmt_body(f, body, depth + 1)?;
                    writeln!(f, "{}}}", pad)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "shader: {} ({})", self.info.name, self.info.stage)?;
        if let Some(entry) = &self.info.entry_point {
            writeln!(f, "entry: {}", entry)?;
        }
        for g in self.globals.iter() {
            let var = self.variable(*g);
            write!(f, "decl_var {:?} {} {}", var.class, var.ty, var.name)?;
            if let Some(init) = &var.constant_initializer {
                write!(f, " = {}", init)?;
            }
            writeln!(f)?;
        }
        for func in self.functions.iter() {
            writeln!(f)?;
            match &func.impl_ {
                None => writeln!(f, "decl_function {} (extern)", func.name)?,
                Some(imp) => {
                    writeln!(f, "impl {} {{", func.name)?;
                    for p in imp.params.iter() {
                        let var = self.variable(*p);
                        writeln!(f, "    decl_param {} {}", var.ty, var.name)?;
                    }
                    for l in imp.locals.iter() {
                        let var = self.variable(*l);
                        write!(f, "    decl_var {:?} {} {}", var.class, var.ty, var.name)?;
                        if let Some(init) = &var.constant_initializer {
                            write!(f, " = {}", init)?;
                        }
                        writeln!(f)?;
                    }
                    self.fmt_body(f, &imp.body, 1)?;
                    writeln!(f, "}}")?;
                }
            }
        }
        Ok(())
    }
}
