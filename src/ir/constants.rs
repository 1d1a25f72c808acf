use crate::foundation::error::VgirResult;
use crate::ir::operand::{Operand, OperandKind};
use crate::ir::writer::InstructionWriter;

/// Declares a `u8`-encoded enum operand.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $value:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $value),*
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            pub const fn from_u8(v: u8) -> Option<Self> {
                match v {
                    $($value => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        impl Operand for $name {
            const KIND: OperandKind = OperandKind::U8;

            fn write(self, w: &mut InstructionWriter) -> VgirResult<()> {
                w.write_u8(self as u8)
            }
        }
    };
}

wire_enum!(PaintCap {
    Butt = 0x0,
    Round = 0x1,
    Square = 0x2,
});

wire_enum!(PaintJoin {
    Miter = 0x0,
    Round = 0x1,
    Bevel = 0x2,
});

wire_enum!(
    #[derive(serde::Serialize, serde::Deserialize)]
    BlendMode {
        Clear = 0x0,
        Src = 0x1,
        Dst = 0x2,
        SrcOver = 0x3,
        DstOver = 0x4,
        SrcIn = 0x5,
        DstIn = 0x6,
        SrcOut = 0x7,
        DstOut = 0x8,
        SrcATop = 0x9,
        DstATop = 0xa,
        Xor = 0xb,
        Plus = 0xc,
        Modulate = 0xd,
        Screen = 0xe,
        Overlay = 0xf,
        Darken = 0x10,
        Lighten = 0x11,
        ColorDodge = 0x12,
        ColorBurn = 0x13,
        HardLight = 0x14,
        SoftLight = 0x15,
        Difference = 0x16,
        Exclusion = 0x17,
        Multiply = 0x18,
        Hue = 0x19,
        Saturation = 0x1a,
        Color = 0x1b,
        Luminosity = 0x1c,
    }
);

impl Default for BlendMode {
    fn default() -> Self {
        Self::SrcOver
    }
}

wire_enum!(TileMode {
    Clamp = 0x0,
    Repeat = 0x1,
    Mirror = 0x2,
    Decal = 0x3,
});

wire_enum!(RegionOp {
    Difference = 0x0,
    Intersect = 0x1,
    Union = 0x2,
    Xor = 0x3,
    ReverseDifference = 0x4,
    Replace = 0x5,
});

wire_enum!(ColorChannel {
    R = 0x0,
    G = 0x1,
    B = 0x2,
    A = 0x3,
});

wire_enum!(FilterMode {
    Nearest = 0x0,
    Linear = 0x1,
});

wire_enum!(MipmapMode {
    None = 0x0,
    Nearest = 0x1,
    Linear = 0x2,
});

wire_enum!(PathFillType {
    Winding = 0x0,
    EvenOdd = 0x1,
    InverseWinding = 0x2,
    InverseEvenOdd = 0x3,
});

wire_enum!(ClipOp {
    Difference = 0x0,
    Intersect = 0x1,
});

wire_enum!(BlurStyle {
    Normal = 0x0,
    Solid = 0x1,
    Outer = 0x2,
    Inner = 0x3,
});
