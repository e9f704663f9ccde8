//! The closed set of built-in query functions and their signatures.

use crate::ValueType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    GetActualX,
    GetActualY,
    GetCanvasSize,
    IsBrushColor,
    IsBrushSize,
    IsCanvasColor,
    GetColorCount,
    GetRandomInt,
}

impl Builtin {
    pub const ALL: [Builtin; 8] = [
        Builtin::GetActualX,
        Builtin::GetActualY,
        Builtin::GetCanvasSize,
        Builtin::IsBrushColor,
        Builtin::IsBrushSize,
        Builtin::IsCanvasColor,
        Builtin::GetColorCount,
        Builtin::GetRandomInt,
    ];

    /// Looks up a built-in by its exact (case sensitive) name.
    pub fn from_name(ident: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|builtin| builtin.name() == ident)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::GetActualX => "GetActualX",
            Builtin::GetActualY => "GetActualY",
            Builtin::GetCanvasSize => "GetCanvasSize",
            Builtin::IsBrushColor => "IsBrushColor",
            Builtin::IsBrushSize => "IsBrushSize",
            Builtin::IsCanvasColor => "IsCanvasColor",
            Builtin::GetColorCount => "GetColorCount",
            Builtin::GetRandomInt => "GetRandomInt",
        }
    }

    /// Parameter types, in order.
    pub fn params(self) -> &'static [ValueType] {
        use crate::ValueType::{IntOrBool as I, Str as S};
        match self {
            Builtin::GetActualX | Builtin::GetActualY | Builtin::GetCanvasSize => &[],
            Builtin::IsBrushColor => &[S],
            Builtin::IsBrushSize => &[I],
            Builtin::IsCanvasColor => &[S, I, I],
            Builtin::GetColorCount => &[S, I, I, I, I],
            Builtin::GetRandomInt => &[I, I],
        }
    }

    /// Every built-in returns an integer or a boolean.
    pub fn return_type(self) -> ValueType {
        ValueType::IntOrBool
    }

    pub fn arity(self) -> usize {
        self.params().len()
    }
}
